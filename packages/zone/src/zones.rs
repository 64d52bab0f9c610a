//! Zone polygon normalization.
//!
//! Flattens the primary zone geometry into a feature list plus a
//! [`NameLookup`], and resolves the outline overlay drawn on top of it.

use desire_lines_zone_models::NameLookup;
use geo::BoundingRect;
use geojson::{Feature, JsonObject, JsonValue};

use crate::fields::{zone_id, zone_name};
use crate::shape::{ObjectKey, classify, into_features};

/// Normalized zone polygons and their names.
#[derive(Debug, Clone, Default)]
pub struct ZoneLayer {
    /// Zone features in source order, followed by any injected features.
    pub features: Vec<Feature>,
    /// Zone id to display name.
    pub names: NameLookup,
}

/// Normalizes a zone geometry container.
///
/// Accepts a feature collection, a geometry collection, or a topology whose
/// polygon object is `preferred_key` (falling back to the first object).
/// Every name is registered under the feature's explicit identifier and
/// under its 1-based position. An unusable container yields an empty
/// layer.
#[must_use]
pub fn normalize_zones(container: &JsonValue, preferred_key: &str) -> ZoneLayer {
    let shape = classify(container, ObjectKey::Preferred(preferred_key));
    log::debug!("Zone geometry classified as {}", shape.label());

    let features = match into_features(shape) {
        Ok(features) => features,
        Err(e) => {
            log::warn!("No usable zone geometry: {e}");
            return ZoneLayer::default();
        }
    };

    let empty = JsonObject::new();
    let mut names = NameLookup::default();
    for (position, feature) in (1..).zip(&features) {
        let properties = feature.properties.as_ref().unwrap_or(&empty);
        let Some(name) = zone_name(properties) else {
            continue;
        };
        if let Some(id) = zone_id(properties) {
            names.register(id, name.clone());
        }
        names.register(position, name);
    }

    log::info!(
        "Normalized {} zone features with {} named ids",
        features.len(),
        names.len()
    );

    ZoneLayer { features, names }
}

/// Outline overlay features (county boundaries).
///
/// Uses the primary container's `overlay_key` object when it has one,
/// otherwise the fallback collection.
#[must_use]
pub fn overlay_features(
    primary: &JsonValue,
    fallback: Option<&JsonValue>,
    overlay_key: &str,
) -> Vec<Feature> {
    let has_overlay = primary
        .get("objects")
        .and_then(|objects| objects.get(overlay_key))
        .is_some();

    let source = if has_overlay { Some(primary) } else { fallback };
    let Some(source) = source else {
        return Vec::new();
    };

    into_features(classify(source, ObjectKey::Exact(overlay_key))).unwrap_or_else(|e| {
        log::warn!("No usable overlay geometry: {e}");
        Vec::new()
    })
}

/// Bounding rectangle of every feature geometry, for framing the map.
#[must_use]
pub fn zone_bounds(features: &[Feature]) -> Option<geo::Rect<f64>> {
    features
        .iter()
        .filter_map(|feature| feature.geometry.clone())
        .filter_map(|geometry| geo::Geometry::<f64>::try_from(geometry).ok())
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|a, b| {
            geo::Rect::new(
                geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn superdistricts() -> JsonValue {
        json!({
            "type": "Topology",
            "arcs": [
                [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
                [[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]
            ],
            "objects": {
                "superdistricts": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "arcs": [[0]], "properties": { "id": 10, "name": "Buckhead" } },
                        { "type": "Polygon", "arcs": [[1]], "properties": { "LOGRECNO": "22", "NAME": "Midtown" } }
                    ]
                }
            }
        })
    }

    #[test]
    fn registers_explicit_and_positional_ids() {
        let layer = normalize_zones(&superdistricts(), "superdistricts");
        assert_eq!(layer.features.len(), 2);

        assert_eq!(layer.names.get(10), Some("Buckhead"));
        assert_eq!(layer.names.get(1), Some("Buckhead"));
        assert_eq!(layer.names.get(22), Some("Midtown"));
        assert_eq!(layer.names.get(2), Some("Midtown"));
        assert_eq!(layer.names.len(), 4);
    }

    #[test]
    fn probes_first_object_when_preferred_is_missing() {
        let mut topology = superdistricts();
        let objects = topology["objects"].as_object_mut().unwrap();
        let zones = objects.remove("superdistricts").unwrap();
        objects.insert("transit".to_string(), zones);

        let layer = normalize_zones(&topology, "superdistricts");
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.names.get(1), Some("Buckhead"));
    }

    #[test]
    fn unusable_container_yields_empty_layer() {
        for input in [json!({}), json!({ "objects": {} }), json!([1, 2, 3])] {
            let layer = normalize_zones(&input, "superdistricts");
            assert!(layer.features.is_empty());
            assert!(layer.names.is_empty());
        }
    }

    #[test]
    fn accepts_plain_feature_collections() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
                "properties": { "NAME": "Cobb" }
            }]
        });
        let layer = normalize_zones(&input, "superdistricts");
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.names.get(1), Some("Cobb"));
    }

    #[test]
    fn unreadable_feature_keeps_later_positions() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "id": 10, "name": "A" } },
                { "type": "Feature", "properties": { "id": 20, "name": "B" } },
                { "type": "Feature", "geometry": null, "properties": { "id": 30, "name": "C" } }
            ]
        });
        let layer = normalize_zones(&input, "superdistricts");
        assert_eq!(layer.features.len(), 3);
        assert_eq!(layer.names.get(2), Some("B"));
        assert_eq!(layer.names.get(20), Some("B"));
        assert_eq!(layer.names.get(3), Some("C"));
    }

    #[test]
    fn bad_arc_does_not_empty_the_layer() {
        let mut topology = superdistricts();
        topology["objects"]["superdistricts"]["geometries"][1]["arcs"] = json!([[9]]);

        let layer = normalize_zones(&topology, "superdistricts");
        assert_eq!(layer.features.len(), 2);
        assert!(layer.features[0].geometry.is_some());
        assert!(layer.features[1].geometry.is_none());
        assert_eq!(layer.names.get(1), Some("Buckhead"));
        assert_eq!(layer.names.get(2), Some("Midtown"));
    }

    #[test]
    fn overlay_prefers_primary_counties() {
        let mut topology = superdistricts();
        topology["objects"]["counties"] = json!({
            "type": "GeometryCollection",
            "geometries": [{ "type": "Polygon", "arcs": [[1]] }]
        });
        let fallback = json!({ "type": "FeatureCollection", "features": [] });

        assert_eq!(overlay_features(&topology, Some(&fallback), "counties").len(), 1);
        assert!(overlay_features(&superdistricts(), Some(&fallback), "counties").is_empty());
        assert!(overlay_features(&superdistricts(), None, "counties").is_empty());
    }

    #[test]
    fn overlay_wraps_fallback_geometry_collection() {
        let fallback = json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]], "properties": { "NAME": "Cherokee" } }
            ]
        });
        let overlay = overlay_features(&superdistricts(), Some(&fallback), "counties");
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay[0].property("NAME"), Some(&json!("Cherokee")));
    }

    #[test]
    fn bounds_cover_every_feature() {
        let layer = normalize_zones(&superdistricts(), "superdistricts");
        let bounds = zone_bounds(&layer.features).unwrap();
        assert!((bounds.min().x).abs() < f64::EPSILON);
        assert!((bounds.min().y).abs() < f64::EPSILON);
        assert!((bounds.max().x - 3.0).abs() < f64::EPSILON);
        assert!((bounds.max().y - 3.0).abs() < f64::EPSILON);
        assert!(zone_bounds(&[]).is_none());
    }
}
