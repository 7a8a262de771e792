//! Zipped ESRI shapefile output format.

mod dbf;
mod shp;

use geoport_types::{ExportFormat, FeatureCollection, Geometry, Position, Properties};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{Encoder, FormatError};
use shp::Shape;

/// WGS 84 geographic coordinate system.
const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Code page declaring the attribute table encoding.
const CODE_PAGE: &str = "UTF-8";

/// Geometry category, one shapefile set per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    /// Point features.
    Points,
    /// LineString and MultiLineString features.
    Lines,
    /// Polygon and MultiPolygon features.
    Polygons,
}

impl ShapeCategory {
    /// Returns all categories in archive order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Points, Self::Lines, Self::Polygons]
    }

    /// Returns the file stem used inside the archive.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Lines => "lines",
            Self::Polygons => "polygons",
        }
    }

    /// Returns the ESRI shape type code.
    #[must_use]
    pub const fn shape_type(self) -> i32 {
        match self {
            Self::Points => 1,
            Self::Lines => 3,
            Self::Polygons => 5,
        }
    }

    /// Returns the category a geometry is exported under, if any.
    #[must_use]
    pub const fn of(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Point { .. } => Some(Self::Points),
            Geometry::LineString { .. } | Geometry::MultiLineString { .. } => Some(Self::Lines),
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => Some(Self::Polygons),
            Geometry::MultiPoint { .. } | Geometry::GeometryCollection { .. } => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::Polygons => 2,
        }
    }
}

/// Shapefile encoder.
///
/// Features are grouped by [`ShapeCategory`]; each non-empty category
/// becomes a `.shp`/`.shx`/`.dbf`/`.prj`/`.cpg` set inside one deflate-compressed
/// zip archive. Features without a point, line or polygon geometry are
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct ShapefileEncoder {
    /// Deflate level, `None` for the library default.
    compression_level: Option<i32>,
}

impl ShapefileEncoder {
    /// Creates a new shapefile encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compression_level: None,
        }
    }

    /// Sets the deflate compression level (0-9).
    #[must_use]
    pub const fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }
}

/// Features of one category, ready to be written.
#[derive(Default)]
struct Layer<'a> {
    shapes: Vec<Shape>,
    rows: Vec<Option<&'a Properties>>,
}

impl Encoder for ShapefileEncoder {
    fn write_collection<W: Write + Send>(
        &self,
        collection: &FeatureCollection,
        mut writer: W,
    ) -> Result<(), FormatError> {
        let mut layers: [Layer<'_>; 3] = Default::default();
        for (index, feature) in collection.features.iter().enumerate() {
            let Some(geometry) = feature.known_geometry() else {
                continue;
            };
            let Some(category) = ShapeCategory::of(geometry) else {
                tracing::debug!(
                    feature = index,
                    geometry = geometry.type_name(),
                    "Skipping geometry with no shapefile category"
                );
                continue;
            };
            let layer = &mut layers[category.index()];
            layer.shapes.push(to_shape(index, geometry)?);
            layer.rows.push(feature.properties.as_ref());
        }

        if layers.iter().all(|layer| layer.shapes.is_empty()) {
            return Err(FormatError::NoGeometry);
        }

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level)
            .unix_permissions(0o644);
        let date = chrono::Utc::now().date_naive();
        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));

        for category in ShapeCategory::all() {
            let layer = &layers[category.index()];
            if layer.shapes.is_empty() {
                continue;
            }
            tracing::debug!(
                category = category.file_stem(),
                records = layer.shapes.len(),
                "Writing shapefile set"
            );

            let stem = category.file_stem();
            let (shp, shx) = shp::write_shapes(category.shape_type(), &layer.shapes)?;
            let mut dbf = Vec::new();
            dbf::write_table(&layer.rows, date, &mut dbf)?;

            for (extension, bytes) in [
                ("shp", shp.as_slice()),
                ("shx", shx.as_slice()),
                ("dbf", dbf.as_slice()),
                ("prj", WGS84_PRJ.as_bytes()),
                ("cpg", CODE_PAGE.as_bytes()),
            ] {
                archive.start_file(format!("{stem}.{extension}"), options)?;
                archive.write_all(bytes)?;
            }
        }

        let buffer = archive.finish()?.into_inner();
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Package
    }
}

fn to_point(index: usize, position: &[f64]) -> Result<[f64; 2], FormatError> {
    match position {
        [x, y, ..] => Ok([*x, *y]),
        _ => Err(FormatError::InvalidGeometry {
            feature: index,
            reason: format!("position has {} coordinates, expected at least 2", position.len()),
        }),
    }
}

fn to_path(index: usize, positions: &[Position]) -> Result<Vec<[f64; 2]>, FormatError> {
    positions.iter().map(|p| to_point(index, p)).collect()
}

/// Twice the signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[[f64; 2]]) -> f64 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|([x0, y0], [x1, y1])| x0 * y1 - x1 * y0)
        .sum()
}

/// Appends a polygon's rings: outer ring clockwise, holes counter-clockwise.
fn push_rings(
    index: usize,
    rings: &[Vec<Position>],
    parts: &mut Vec<Vec<[f64; 2]>>,
) -> Result<(), FormatError> {
    for (ring_index, ring) in rings.iter().enumerate() {
        let mut ring = to_path(index, ring)?;
        let counter_clockwise = signed_area(&ring) > 0.0;
        let is_outer = ring_index == 0;
        if counter_clockwise == is_outer {
            ring.reverse();
        }
        parts.push(ring);
    }
    Ok(())
}

fn to_shape(index: usize, geometry: &Geometry) -> Result<Shape, FormatError> {
    let parts = match geometry {
        Geometry::Point { coordinates } if coordinates.is_empty() => return Ok(Shape::Null),
        Geometry::Point { coordinates } => return Ok(Shape::Point(to_point(index, coordinates)?)),
        Geometry::LineString { coordinates } => vec![to_path(index, coordinates)?],
        Geometry::MultiLineString { coordinates } => coordinates
            .iter()
            .map(|line| to_path(index, line))
            .collect::<Result<_, _>>()?,
        Geometry::Polygon { coordinates } => {
            let mut parts = Vec::with_capacity(coordinates.len());
            push_rings(index, coordinates, &mut parts)?;
            parts
        }
        Geometry::MultiPolygon { coordinates } => {
            let mut parts = Vec::new();
            for polygon in coordinates {
                push_rings(index, polygon, &mut parts)?;
            }
            parts
        }
        Geometry::MultiPoint { .. } | Geometry::GeometryCollection { .. } => {
            return Err(FormatError::InvalidGeometry {
                feature: index,
                reason: format!("{} has no shapefile category", geometry.type_name()),
            });
        }
    };

    let parts: Vec<_> = parts.into_iter().filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        Ok(Shape::Null)
    } else {
        Ok(Shape::Parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
    use geoport_types::Feature;
    use serde_json::json;
    use std::io::Read;
    use zip::ZipArchive;

    fn props(value: serde_json::Value) -> Properties {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn square(origin: f64, size: f64) -> Vec<Position> {
        vec![
            vec![origin, origin],
            vec![origin + size, origin],
            vec![origin + size, origin + size],
            vec![origin, origin + size],
            vec![origin, origin],
        ]
    }

    fn mixed_collection() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(
                Some(Geometry::Point {
                    coordinates: vec![1.0, 2.0],
                }),
                props(json!({"name": "well"})),
            ),
            Feature::new(
                Some(Geometry::Polygon {
                    coordinates: vec![square(0.0, 10.0), square(2.0, 2.0)],
                }),
                props(json!({"name": "park", "area": 96})),
            ),
            Feature::new(
                Some(Geometry::MultiPoint {
                    coordinates: vec![vec![0.0, 0.0]],
                }),
                Properties::new(),
            ),
            Feature::new(None, props(json!({"name": "nowhere"}))),
            Feature::new(
                Some(Geometry::Point {
                    coordinates: vec![3.0, 4.0, 5.0],
                }),
                props(json!({"name": "spring"})),
            ),
        ])
    }

    fn archive(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut file = archive.by_name(name).unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_archive_contents() {
        let bytes = ShapefileEncoder::new().encode(&mixed_collection()).unwrap();
        let mut zip = archive(bytes);

        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "points.cpg",
                "points.dbf",
                "points.prj",
                "points.shp",
                "points.shx",
                "polygons.cpg",
                "polygons.dbf",
                "polygons.prj",
                "polygons.shp",
                "polygons.shx",
            ]
        );

        let prj = String::from_utf8(entry(&mut zip, "points.prj")).unwrap();
        assert!(prj.contains("WGS_1984"));
        assert_eq!(entry(&mut zip, "polygons.cpg"), b"UTF-8");
    }

    #[test]
    fn test_point_set() {
        let bytes = ShapefileEncoder::new().encode(&mixed_collection()).unwrap();
        let mut zip = archive(bytes);
        let shp = entry(&mut zip, "points.shp");

        let mut cursor = Cursor::new(&shp);
        assert_eq!(cursor.read_i32::<BigEndian>().unwrap(), 9994);
        cursor.set_position(32);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), 1);
        assert_relative_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 1.0);
        assert_relative_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 2.0);
        assert_relative_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 3.0);
        assert_relative_eq!(cursor.read_f64::<LittleEndian>().unwrap(), 4.0);
        assert_eq!(shp.len(), 100 + 2 * 28);

        let dbf = entry(&mut zip, "points.dbf");
        assert_eq!(u32::from_le_bytes(dbf[4..8].try_into().unwrap()), 2);
    }

    #[test]
    fn test_polygon_ring_orientation() {
        let bytes = ShapefileEncoder::new().encode(&mixed_collection()).unwrap();
        let mut zip = archive(bytes);
        let shp = entry(&mut zip, "polygons.shp");

        let mut cursor = Cursor::new(&shp[108..]);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), 5);
        cursor.set_position(cursor.position() + 32);
        let parts = cursor.read_i32::<LittleEndian>().unwrap();
        let points = cursor.read_i32::<LittleEndian>().unwrap();
        assert_eq!((parts, points), (2, 10));
        let starts = [
            cursor.read_i32::<LittleEndian>().unwrap(),
            cursor.read_i32::<LittleEndian>().unwrap(),
        ];
        assert_eq!(starts, [0, 5]);

        let mut ring = |n: usize| -> Vec<[f64; 2]> {
            (0..n)
                .map(|_| {
                    [
                        cursor.read_f64::<LittleEndian>().unwrap(),
                        cursor.read_f64::<LittleEndian>().unwrap(),
                    ]
                })
                .collect()
        };
        let outer = ring(5);
        let hole = ring(5);
        assert!(signed_area(&outer) < 0.0, "outer ring must be clockwise");
        assert!(signed_area(&hole) > 0.0, "hole must be counter-clockwise");
        assert_relative_eq!(signed_area(&outer).abs() / 2.0, 100.0);
    }

    #[test]
    fn test_lines_category() {
        let collection = FeatureCollection::new(vec![
            Feature::new(
                Some(Geometry::LineString {
                    coordinates: vec![vec![0.0, 0.0], vec![1.0, 1.0]],
                }),
                Properties::new(),
            ),
            Feature::new(
                Some(Geometry::MultiLineString {
                    coordinates: vec![
                        vec![vec![2.0, 2.0], vec![3.0, 3.0]],
                        vec![vec![4.0, 4.0], vec![5.0, 5.0]],
                    ],
                }),
                Properties::new(),
            ),
        ]);
        let mut zip = archive(ShapefileEncoder::new().encode(&collection).unwrap());

        assert_eq!(zip.len(), 5);
        let shx = entry(&mut zip, "lines.shx");
        assert_eq!(shx.len(), 100 + 2 * 8);
        let dbf = entry(&mut zip, "lines.dbf");
        assert_eq!(&dbf[32..34], b"id");
    }

    #[test]
    fn test_no_geometry_fails() {
        let collection = FeatureCollection::new(vec![
            Feature::new(None, Properties::new()),
            Feature::new(
                Some(Geometry::MultiPoint {
                    coordinates: vec![vec![0.0, 0.0]],
                }),
                Properties::new(),
            ),
        ]);
        let err = ShapefileEncoder::new().encode(&collection).unwrap_err();
        assert!(matches!(err, FormatError::NoGeometry));
        assert_eq!(err.to_string(), "no point, line or polygon geometries to export");
    }

    #[test]
    fn test_empty_geometry_written_as_null() {
        let collection = FeatureCollection::new(vec![
            Feature::new(
                Some(Geometry::Point {
                    coordinates: vec![1.0, 2.0],
                }),
                props(json!({"name": "well"})),
            ),
            Feature::new(
                Some(Geometry::Point {
                    coordinates: vec![],
                }),
                props(json!({"name": "unsurveyed"})),
            ),
            Feature::new(
                Some(Geometry::LineString {
                    coordinates: vec![],
                }),
                Properties::new(),
            ),
        ]);
        let mut zip = archive(ShapefileEncoder::new().encode(&collection).unwrap());

        let shp = entry(&mut zip, "points.shp");
        assert_eq!(shp.len(), 100 + 28 + 12);
        let mut cursor = Cursor::new(&shp[128..]);
        assert_eq!(cursor.read_i32::<BigEndian>().unwrap(), 2);
        assert_eq!(cursor.read_i32::<BigEndian>().unwrap(), 2);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), 0);

        let dbf = entry(&mut zip, "points.dbf");
        assert_eq!(u32::from_le_bytes(dbf[4..8].try_into().unwrap()), 2);
        assert!(zip.by_name("lines.shp").is_ok());
    }

    #[test]
    fn test_non_ascii_attributes_declare_utf8() {
        let collection = FeatureCollection::new(vec![Feature::new(
            Some(Geometry::Point {
                coordinates: vec![1.0, 2.0],
            }),
            props(json!({"name": "Zürich Straße"})),
        )]);
        let mut zip = archive(ShapefileEncoder::new().encode(&collection).unwrap());

        assert_eq!(entry(&mut zip, "points.cpg"), b"UTF-8");
        let dbf = entry(&mut zip, "points.dbf");
        let needle = "Zürich Straße".as_bytes();
        assert!(dbf.windows(needle.len()).any(|window| window == needle));
    }

    #[test]
    fn test_invalid_position_fails() {
        let collection = FeatureCollection::new(vec![Feature::new(
            Some(Geometry::LineString {
                coordinates: vec![vec![0.0, 0.0], vec![1.0]],
            }),
            Properties::new(),
        )]);
        let err = ShapefileEncoder::new().encode(&collection).unwrap_err();
        assert!(matches!(err, FormatError::InvalidGeometry { feature: 0, .. }));
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert!(signed_area(&ccw) > 0.0);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert!(signed_area(&cw) < 0.0);
    }
}
