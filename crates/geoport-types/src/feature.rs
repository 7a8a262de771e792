//! GeoJSON feature collection model.
//!
//! The model keeps everything it does not interpret: unknown members of
//! collections, features and geometries (`bbox`, `crs`, ...) are carried in
//! `foreign_members`, and geometry objects with an unrecognized `type` are
//! kept verbatim as [`GeometryValue::Unrecognized`]. Re-serializing a
//! decoded collection therefore reproduces the input feature-for-feature.

use crate::DecodeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Members a geometry object defines itself.
const GEOMETRY_MEMBERS: [&str; 3] = ["type", "coordinates", "geometries"];

/// A coordinate tuple: longitude, latitude and an optional elevation.
pub type Position = Vec<f64>;

/// Feature properties in document order.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

/// A geometry object of one of the seven GeoJSON types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position.
    Point {
        /// The position.
        coordinates: Position,
    },
    /// A set of positions.
    MultiPoint {
        /// The positions.
        coordinates: Vec<Position>,
    },
    /// An ordered path of positions.
    LineString {
        /// The path.
        coordinates: Vec<Position>,
    },
    /// A set of paths.
    MultiLineString {
        /// The paths.
        coordinates: Vec<Vec<Position>>,
    },
    /// An outer ring followed by zero or more holes.
    Polygon {
        /// The rings, outer ring first.
        coordinates: Vec<Vec<Position>>,
    },
    /// A set of polygons.
    MultiPolygon {
        /// The polygons.
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// A heterogeneous set of geometries.
    GeometryCollection {
        /// The member geometries.
        geometries: Vec<GeometryValue>,
    },
}

impl Geometry {
    /// Returns the GeoJSON type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::MultiPoint { .. } => "MultiPoint",
            Self::LineString { .. } => "LineString",
            Self::MultiLineString { .. } => "MultiLineString",
            Self::Polygon { .. } => "Polygon",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

/// A geometry member as it appeared in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryValue {
    /// A well-formed geometry of a known type.
    Known {
        /// The geometry.
        geometry: Geometry,
        /// Members not defined by GeoJSON geometry objects, such as `bbox`.
        foreign_members: Map<String, Value>,
    },
    /// Any other object, kept verbatim.
    Unrecognized(Map<String, Value>),
}

impl GeometryValue {
    /// Classifies a geometry object.
    ///
    /// Objects that do not decode as one of the seven geometry types are
    /// kept as [`Self::Unrecognized`] with all of their members.
    #[must_use]
    pub fn from_members(members: Map<String, Value>) -> Self {
        let (core, foreign_members): (Map<String, Value>, Map<String, Value>) = members
            .into_iter()
            .partition(|(key, _)| GEOMETRY_MEMBERS.contains(&key.as_str()));
        let core = Value::Object(core);

        match Geometry::deserialize(&core) {
            Ok(geometry) => Self::Known {
                geometry,
                foreign_members,
            },
            Err(_) => {
                let mut members = match core {
                    Value::Object(core) => core,
                    _ => Map::new(),
                };
                members.extend(foreign_members);
                Self::Unrecognized(members)
            }
        }
    }
}

impl From<Geometry> for GeometryValue {
    fn from(geometry: Geometry) -> Self {
        Self::Known {
            geometry,
            foreign_members: Map::new(),
        }
    }
}

#[derive(Serialize)]
struct KnownGeometry<'a> {
    #[serde(flatten)]
    geometry: &'a Geometry,
    #[serde(flatten)]
    foreign_members: &'a Map<String, Value>,
}

impl Serialize for GeometryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known {
                geometry,
                foreign_members,
            } => KnownGeometry {
                geometry,
                foreign_members,
            }
            .serialize(serializer),
            Self::Unrecognized(members) => members.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for GeometryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_members)
    }
}

/// A single feature: an optional geometry plus properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    kind: FeatureTag,
    /// Optional feature identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// The geometry, `null` when absent.
    #[serde(default)]
    pub geometry: Option<GeometryValue>,
    /// The properties, `null` when absent.
    #[serde(default)]
    pub properties: Option<Properties>,
    /// Members not defined by GeoJSON.
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl Feature {
    /// Creates a new feature.
    #[must_use]
    pub fn new(geometry: Option<Geometry>, properties: Properties) -> Self {
        Self {
            kind: FeatureTag::Feature,
            id: None,
            geometry: geometry.map(GeometryValue::from),
            properties: Some(properties),
            foreign_members: Map::new(),
        }
    }

    /// Sets the feature identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the geometry if it is of a known type.
    #[must_use]
    pub const fn known_geometry(&self) -> Option<&Geometry> {
        match &self.geometry {
            Some(GeometryValue::Known { geometry, .. }) => Some(geometry),
            _ => None,
        }
    }

    /// Returns a property value by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    /// Iterates over the properties in document order.
    pub fn property_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.properties.iter().flat_map(|props| props.iter())
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    kind: CollectionTag,
    /// The features in document order.
    pub features: Vec<Feature>,
    /// Members not defined by GeoJSON (`crs`, `totalFeatures`, ...).
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl FeatureCollection {
    /// Creates a collection from features.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionTag::FeatureCollection,
            features,
            foreign_members: Map::new(),
        }
    }

    /// Decodes a response body into a feature collection.
    ///
    /// The body must be UTF-8 JSON text whose top level is an object with a
    /// `features` array.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not text, not JSON, or not shaped
    /// like a feature collection.
    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(body)?;
        let document: Value = serde_json::from_str(text)?;

        let Value::Object(members) = &document else {
            return Err(DecodeError::NotAnObject);
        };
        if !matches!(members.get("features"), Some(Value::Array(_))) {
            return Err(DecodeError::MissingFeatures);
        }

        Ok(serde_json::from_value(document)?)
    }

    /// Serializes the collection as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Returns the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the collection has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "totalFeatures": 2,
        "features": [
            {
                "type": "Feature",
                "id": "states.1",
                "geometry": {"type": "Point", "coordinates": [-120.5, 47.25]},
                "properties": {"name": "Washington", "pop": 7705281},
                "geometry_name": "the_geom"
            },
            {
                "type": "Feature",
                "geometry": {"type": "Circle", "center": [0, 0], "radius": 5},
                "properties": null
            }
        ]
    }"#;

    #[test]
    fn test_decode_collection() {
        let collection = FeatureCollection::from_slice(STATES.as_bytes()).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.foreign_members.get("totalFeatures"), Some(&json!(2)));

        let first = &collection.features[0];
        assert_eq!(first.id, Some(json!("states.1")));
        assert_eq!(first.property("name"), Some(&json!("Washington")));
        assert_eq!(
            first.known_geometry(),
            Some(&Geometry::Point {
                coordinates: vec![-120.5, 47.25]
            })
        );
        assert_eq!(first.foreign_members.get("geometry_name"), Some(&json!("the_geom")));
    }

    #[test]
    fn test_unrecognized_geometry_kept() {
        let collection = FeatureCollection::from_slice(STATES.as_bytes()).unwrap();
        let second = &collection.features[1];
        assert!(second.known_geometry().is_none());
        assert!(matches!(second.geometry, Some(GeometryValue::Unrecognized(_))));
        assert!(second.properties.is_none());
        assert_eq!(second.property_entries().count(), 0);
    }

    #[test]
    fn test_reserialize_round_trip() {
        let collection = FeatureCollection::from_slice(STATES.as_bytes()).unwrap();
        let bytes = collection.to_vec().unwrap();
        let decoded = FeatureCollection::from_slice(&bytes).unwrap();
        assert_eq!(decoded, collection);
    }

    #[test]
    fn test_geometry_members_round_trip() {
        let body = r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[1.5,2.5],"bbox":[1.5,2.5,1.5,2.5]},"properties":{}}]}"#;
        let collection = FeatureCollection::from_slice(body.as_bytes()).unwrap();

        match &collection.features[0].geometry {
            Some(GeometryValue::Known {
                geometry,
                foreign_members,
            }) => {
                assert_eq!(geometry.type_name(), "Point");
                assert_eq!(foreign_members.get("bbox"), Some(&json!([1.5, 2.5, 1.5, 2.5])));
            }
            other => panic!("unexpected geometry: {other:?}"),
        }

        let value: Value = serde_json::from_slice(&collection.to_vec().unwrap()).unwrap();
        assert_eq!(
            value["features"][0]["geometry"],
            json!({"type": "Point", "coordinates": [1.5, 2.5], "bbox": [1.5, 2.5, 1.5, 2.5]})
        );
    }

    #[test]
    fn test_nested_collection_members_kept() {
        let body = r#"{"features":[{"geometry":{"type":"GeometryCollection","geometries":[
            {"type":"Point","coordinates":[0,0],"crs":"local"},
            {"type":"Arc","points":[[0,0],[1,1]]}
        ]}}]}"#;
        let collection = FeatureCollection::from_slice(body.as_bytes()).unwrap();

        let Some(Geometry::GeometryCollection { geometries }) =
            collection.features[0].known_geometry()
        else {
            panic!("expected a geometry collection");
        };
        assert!(matches!(
            &geometries[0],
            GeometryValue::Known { foreign_members, .. } if foreign_members.get("crs") == Some(&json!("local"))
        ));
        assert!(matches!(&geometries[1], GeometryValue::Unrecognized(members) if members.contains_key("points")));

        let reencoded = FeatureCollection::from_slice(&collection.to_vec().unwrap()).unwrap();
        assert_eq!(reencoded, collection);
    }

    #[test]
    fn test_property_order_preserved() {
        let body = r#"{"features":[{"geometry":null,"properties":{"z":1,"a":2,"m":3}}]}"#;
        let collection = FeatureCollection::from_slice(body.as_bytes()).unwrap();
        let keys: Vec<_> = collection.features[0]
            .property_entries()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_missing_type_members_accepted() {
        let body = r#"{"features":[{"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}]}"#;
        let collection = FeatureCollection::from_slice(body.as_bytes()).unwrap();
        assert_eq!(
            collection.features[0].known_geometry().map(Geometry::type_name),
            Some("LineString")
        );
    }

    #[test]
    fn test_rejects_non_object() {
        let result = FeatureCollection::from_slice(b"[1, 2, 3]");
        assert!(matches!(result, Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn test_rejects_missing_features() {
        let result = FeatureCollection::from_slice(br#"{"type":"FeatureCollection"}"#);
        assert!(matches!(result, Err(DecodeError::MissingFeatures)));

        let result = FeatureCollection::from_slice(br#"{"features":{}}"#);
        assert!(matches!(result, Err(DecodeError::MissingFeatures)));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let result = FeatureCollection::from_slice(b"<html>Service Unavailable</html>");
        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let result = FeatureCollection::from_slice(&[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_constructed_collection_serializes_type_members() {
        let feature = Feature::new(
            Some(Geometry::Point {
                coordinates: vec![1.0, 2.0],
            }),
            Properties::new(),
        )
        .with_id(7);
        let value = serde_json::to_value(FeatureCollection::new(vec![feature])).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(value["features"][0]["type"], json!("Feature"));
        assert_eq!(value["features"][0]["id"], json!(7));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("Point"));
    }
}
