//! Structural classification of geometry inputs.
//!
//! Polygon and line sources arrive as plain feature collections, as
//! objects wrapping a geometry collection whose entries already carry
//! literal coordinates, or as true arc-encoded topologies. The shape is
//! decided once by [`classify`] and then dispatched on.

use geojson::{Feature, Geometry, JsonObject, JsonValue};

use crate::ZoneError;
use crate::topology::Topology;

/// How to pick the named sub-collection of a topology-like container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKey<'a> {
    /// Only this key is accepted.
    Exact(&'a str),
    /// This key if present, otherwise the container's first object.
    Preferred(&'a str),
}

/// The recognized structure of a geometry input.
#[derive(Debug)]
pub enum CollectionShape<'a> {
    /// `{"type": "FeatureCollection", "features": [...]}`.
    FeatureCollection(&'a [JsonValue]),
    /// Geometry entries that already hold literal `coordinates`.
    LiteralGeometryCollection(&'a [JsonValue]),
    /// An arc-encoded topology object that must be decoded.
    EncodedTopology {
        /// Key of the object inside `objects`.
        key: String,
        /// The whole topology document.
        topology: &'a JsonValue,
        /// The selected object.
        object: &'a JsonValue,
    },
    /// Nothing recognizable; carries a diagnostic.
    Unrecognized(String),
}

impl CollectionShape<'_> {
    /// Short name of the shape for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FeatureCollection(_) => "feature collection",
            Self::LiteralGeometryCollection(_) => "literal geometry collection",
            Self::EncodedTopology { .. } => "encoded topology",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Decides the shape of a geometry input by structural probing.
#[must_use]
pub fn classify<'a>(input: &'a JsonValue, key: ObjectKey<'_>) -> CollectionShape<'a> {
    let type_tag = input.get("type").and_then(JsonValue::as_str);

    if type_tag == Some("FeatureCollection") {
        return input
            .get("features")
            .and_then(JsonValue::as_array)
            .map_or_else(
                || CollectionShape::Unrecognized("feature collection has no features array".into()),
                |features| CollectionShape::FeatureCollection(features.as_slice()),
            );
    }

    if type_tag == Some("GeometryCollection")
        && let Some(geometries) = input.get("geometries").and_then(JsonValue::as_array)
    {
        return CollectionShape::LiteralGeometryCollection(geometries.as_slice());
    }

    let Some(objects) = input.get("objects").and_then(JsonValue::as_object) else {
        return CollectionShape::Unrecognized(format!(
            "expected a FeatureCollection, GeometryCollection, or topology; found {}",
            type_tag.map_or_else(|| "untyped object".to_string(), |t| format!("type '{t}'"))
        ));
    };

    let Some((name, object)) = select_object(objects, key) else {
        return CollectionShape::Unrecognized(match key {
            ObjectKey::Exact(name) => format!("topology has no '{name}' object"),
            ObjectKey::Preferred(_) => "topology has no objects".to_string(),
        });
    };

    if let Some(geometries) = literal_geometries(object) {
        return CollectionShape::LiteralGeometryCollection(geometries);
    }

    CollectionShape::EncodedTopology {
        key: name,
        topology: input,
        object,
    }
}

fn select_object<'a>(
    objects: &'a JsonObject,
    key: ObjectKey<'_>,
) -> Option<(String, &'a JsonValue)> {
    let named = |name: &str| objects.get(name).map(|object| (name.to_string(), object));
    match key {
        ObjectKey::Exact(name) => named(name),
        ObjectKey::Preferred(name) => named(name).or_else(|| {
            let (fallback, object) = objects.iter().next()?;
            log::debug!("No '{name}' object in topology, using first object '{fallback}'");
            Some((fallback.clone(), object))
        }),
    }
}

/// Geometries of a collection whose first entry already holds literal
/// coordinates.
fn literal_geometries(object: &JsonValue) -> Option<&[JsonValue]> {
    if object.get("type").and_then(JsonValue::as_str) != Some("GeometryCollection") {
        return None;
    }
    let geometries = object.get("geometries")?.as_array()?;
    geometries
        .first()?
        .get("coordinates")
        .map(|_| geometries.as_slice())
}

/// Converts a classified input into a flat feature list.
///
/// # Errors
///
/// Returns [`ZoneError::StructuralMismatch`] for an unrecognized shape and
/// [`ZoneError::Topology`] or [`ZoneError::Json`] if decoding fails.
pub fn into_features(shape: CollectionShape<'_>) -> Result<Vec<Feature>, ZoneError> {
    match shape {
        CollectionShape::FeatureCollection(features) => {
            Ok(features.iter().map(read_feature).collect())
        }
        CollectionShape::LiteralGeometryCollection(geometries) => {
            Ok(geometries.iter().map(wrap_geometry).collect())
        }
        CollectionShape::EncodedTopology {
            topology, object, ..
        } => Topology::from_value(topology)?.features(object),
        CollectionShape::Unrecognized(message) => Err(ZoneError::StructuralMismatch { message }),
    }
}

/// Parses a feature entry. An entry that is not a valid feature keeps its
/// slot, with its `properties` and whatever geometry still parses.
fn read_feature(value: &JsonValue) -> Feature {
    serde_json::from_value::<Feature>(value.clone()).unwrap_or_else(|e| {
        log::warn!("Keeping invalid feature as an empty slot: {e}");
        let geometry = value
            .get("geometry")
            .filter(|geometry| !geometry.is_null())
            .and_then(|geometry| serde_json::from_value::<Geometry>(geometry.clone()).ok());
        Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties_of(value)),
            foreign_members: None,
        }
    })
}

/// The entry's `properties` object, or an empty bag.
fn properties_of(value: &JsonValue) -> JsonObject {
    value
        .get("properties")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Wraps a literal geometry as a feature, moving its `properties` (or an
/// empty bag) onto the feature.
fn wrap_geometry(value: &JsonValue) -> Feature {
    let properties = properties_of(value);

    let mut bare = value.clone();
    if let Some(object) = bare.as_object_mut() {
        object.remove("properties");
    }
    let geometry = match serde_json::from_value::<Geometry>(bare) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            log::warn!("Wrapping unreadable geometry as an empty feature: {e}");
            None
        }
    };

    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
