//! Encoder benchmarks over synthetic layers.
//!
//! Run with: `cargo bench --package geoport-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geoport_bench::{LayerShape, raw_size, synthetic_collection};
use geoport_lib::{ExportFormat, encode_collection};
use std::hint::black_box;

const SIZES: [usize; 2] = [1_000, 10_000];

fn shapes() -> [LayerShape; 3] {
    [
        LayerShape::Points,
        LayerShape::Lines { vertices: 32 },
        LayerShape::Polygons,
    ]
}

fn encode_benchmark(c: &mut Criterion) {
    for format in ExportFormat::all() {
        let mut group = c.benchmark_group(format!("encode/{}", format.as_str()));
        group.sample_size(20);

        for shape in shapes() {
            for size in SIZES {
                let collection = synthetic_collection(shape, size);
                group.throughput(Throughput::Bytes(raw_size(&collection)));
                let id = BenchmarkId::new(shape.label(), size);
                group.bench_with_input(id, &collection, |b, collection| {
                    b.iter(|| {
                        encode_collection(*format, "bench:layer", black_box(collection))
                            .expect("encoding synthetic layer")
                    });
                });
            }
        }

        group.finish();
    }
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in SIZES {
        let body = synthetic_collection(LayerShape::Polygons, size)
            .to_vec()
            .expect("serializing synthetic layer");
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("polygons", size), &body, |b, body| {
            b.iter(|| {
                geoport_lib::FeatureCollection::from_slice(black_box(body))
                    .expect("decoding synthetic layer")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
