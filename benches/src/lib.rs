//! Benchmark utilities for geoport.
//!
//! Builds synthetic feature collections shaped like typical WFS layers so
//! the encoders can be measured without a live feature service.

use geoport_lib::{Feature, FeatureCollection, Geometry, Properties};
use serde_json::{Value, json};

/// Geometry mix of a synthetic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerShape {
    /// Point features only.
    Points,
    /// Open paths with `vertices` positions each.
    Lines {
        /// Positions per path.
        vertices: usize,
    },
    /// Square polygons, every other one with a hole.
    Polygons,
}

impl LayerShape {
    /// Short label used in benchmark ids.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Lines { .. } => "lines",
            Self::Polygons => "polygons",
        }
    }
}

/// Builds a collection of `count` features.
///
/// Each feature carries a name, a numeric population, a boolean flag and
/// a free-text category so the attribute table exercises every column
/// type.
#[must_use]
pub fn synthetic_collection(shape: LayerShape, count: usize) -> FeatureCollection {
    let features = (0..count)
        .map(|i| Feature::new(Some(geometry(shape, i)), properties(i)).with_id(i as u64))
        .collect();
    FeatureCollection::new(features)
}

/// Encoded size of the collection as raw GeoJSON.
#[must_use]
pub fn raw_size(collection: &FeatureCollection) -> u64 {
    collection.to_vec().map_or(0, |bytes| bytes.len() as u64)
}

fn geometry(shape: LayerShape, i: usize) -> Geometry {
    let x = (i % 360) as f64 - 180.0;
    let y = ((i / 360) % 180) as f64 - 90.0;
    match shape {
        LayerShape::Points => Geometry::Point {
            coordinates: vec![x, y],
        },
        LayerShape::Lines { vertices } => Geometry::LineString {
            coordinates: (0..vertices)
                .map(|v| vec![x + v as f64 * 0.001, y + (v % 2) as f64 * 0.001])
                .collect(),
        },
        LayerShape::Polygons => {
            let mut rings = vec![square(x, y, 0.5)];
            if i % 2 == 1 {
                rings.push(square(x + 0.1, y + 0.1, 0.2));
            }
            Geometry::Polygon { coordinates: rings }
        }
    }
}

fn square(x: f64, y: f64, size: f64) -> Vec<Vec<f64>> {
    vec![
        vec![x, y],
        vec![x + size, y],
        vec![x + size, y + size],
        vec![x, y + size],
        vec![x, y],
    ]
}

fn properties(i: usize) -> Properties {
    let category = ["park", "road", "river"][i % 3];
    let value = json!({
        "name": format!("Feature <{i}> & co"),
        "population": i * 17,
        "active": i % 3 == 0,
        "category": category,
    });
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_collection_size() {
        let collection = synthetic_collection(LayerShape::Points, 25);
        assert_eq!(collection.len(), 25);
        assert!(raw_size(&collection) > 0);
    }

    #[test]
    fn test_polygons_alternate_holes() {
        let collection = synthetic_collection(LayerShape::Polygons, 2);
        let rings: Vec<usize> = collection
            .features
            .iter()
            .map(|feature| match feature.known_geometry() {
                Some(Geometry::Polygon { coordinates }) => coordinates.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(rings, [1, 2]);
    }

    #[test]
    fn test_lines_have_requested_vertices() {
        let collection = synthetic_collection(LayerShape::Lines { vertices: 12 }, 1);
        match collection.features[0].known_geometry() {
            Some(Geometry::LineString { coordinates }) => assert_eq!(coordinates.len(), 12),
            other => panic!("unexpected geometry: {other:?}"),
        }
    }
}
