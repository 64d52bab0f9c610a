//! Desire-line feature resolution.

use geojson::{Feature, JsonValue};

use crate::shape::{ObjectKey, classify, into_features};

/// Resolves desire-line features from whichever shape the input takes.
///
/// A feature collection is used directly. A container whose `object_key`
/// object holds literal geometries has each geometry wrapped as a feature,
/// and an arc-encoded topology is decoded. Absent or unrecognized input
/// yields no lines.
#[must_use]
pub fn resolve_lines(input: Option<&JsonValue>, object_key: &str) -> Vec<Feature> {
    let Some(input) = input else {
        log::debug!("No desire-line geometry loaded");
        return Vec::new();
    };

    let shape = classify(input, ObjectKey::Exact(object_key));
    let label = shape.label();

    match into_features(shape) {
        Ok(lines) => {
            log::info!("Resolved {} desire lines from {label}", lines.len());
            lines
        }
        Err(e) => {
            log::warn!("Desire-line geometry unusable: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fields::line_pair;
    use desire_lines_flow_models::ZonePair;

    #[test]
    fn uses_feature_collection_directly() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                "properties": { "ORIG": 1, "DEST": 2 }
            }]
        });
        let lines = resolve_lines(Some(&input), "desirelines");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_pair(&lines[0]), Some(ZonePair::new(1, 2)));
    }

    #[test]
    fn wraps_literal_geometries() {
        let input = json!({
            "type": "Topology",
            "objects": {
                "desirelines": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "LineString", "coordinates": [[0, 0], [1, 1]], "properties": { "o": 3, "d": 4 } },
                        { "type": "LineString", "coordinates": [[1, 1], [2, 2]], "properties": { "o": 4, "d": 5 } }
                    ]
                }
            }
        });
        let lines = resolve_lines(Some(&input), "desirelines");
        assert_eq!(lines.len(), 2);
        assert_eq!(line_pair(&lines[1]), Some(ZonePair::new(4, 5)));
    }

    #[test]
    fn decodes_encoded_topology() {
        let input = json!({
            "type": "Topology",
            "transform": { "scale": [0.5, 0.5], "translate": [10.0, 20.0] },
            "arcs": [[[0, 0], [2, 2]]],
            "objects": {
                "desirelines": {
                    "type": "GeometryCollection",
                    "geometries": [{ "type": "LineString", "arcs": [0], "properties": { "origin": 7, "destination": 8 } }]
                }
            }
        });
        let lines = resolve_lines(Some(&input), "desirelines");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_pair(&lines[0]), Some(ZonePair::new(7, 8)));

        let Some(geojson::Value::LineString(points)) =
            lines[0].geometry.as_ref().map(|g| &g.value)
        else {
            panic!("expected a line string");
        };
        assert_eq!(points, &vec![vec![10.0, 20.0], vec![11.0, 21.0]]);
    }

    #[test]
    fn bad_arc_drops_only_its_own_geometry() {
        let input = json!({
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.0, 1.0]]],
            "objects": {
                "desirelines": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "LineString", "arcs": [0], "properties": { "o": 1, "d": 2 } },
                        { "type": "LineString", "arcs": [5], "properties": { "o": 2, "d": 3 } }
                    ]
                }
            }
        });
        let lines = resolve_lines(Some(&input), "desirelines");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].geometry.is_some());
        assert!(lines[1].geometry.is_none());
        assert_eq!(line_pair(&lines[1]), Some(ZonePair::new(2, 3)));
    }

    #[test]
    fn unrecognized_or_absent_input_yields_no_lines() {
        assert!(resolve_lines(None, "desirelines").is_empty());
        assert!(resolve_lines(Some(&json!({ "type": "Point" })), "desirelines").is_empty());
        assert!(resolve_lines(Some(&json!({ "objects": {} })), "desirelines").is_empty());
    }
}
