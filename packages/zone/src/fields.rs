//! Property-bag field resolution.
//!
//! Sources disagree on property names (`id` vs `LOGRECNO` vs `GEOID`,
//! `name` vs `NAME`), so each logical attribute is read from an ordered
//! list of candidate names, first match wins.

use desire_lines_flow_models::{ZoneId, ZonePair, parse_zone_id};
use desire_lines_zone_models::{
    LINE_DESTINATION_FIELDS, LINE_ORIGIN_FIELDS, ZONE_ID_FIELDS, ZONE_NAME_FIELDS,
};
use geojson::{Feature, JsonObject, JsonValue};

/// Returns the value of the first candidate field present and non-null.
#[must_use]
pub fn resolve_field<'a>(bag: &'a JsonObject, candidates: &[&str]) -> Option<&'a JsonValue> {
    candidates
        .iter()
        .find_map(|name| bag.get(*name).filter(|v| !v.is_null()))
}

/// Reads a zone id from a JSON number or numeric string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn zone_id_value(value: &JsonValue) -> Option<ZoneId> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as ZoneId)
        }),
        JsonValue::String(s) => parse_zone_id(s),
        _ => None,
    }
}

/// Explicit zone identifier from a property bag.
#[must_use]
pub fn zone_id(bag: &JsonObject) -> Option<ZoneId> {
    resolve_field(bag, ZONE_ID_FIELDS).and_then(zone_id_value)
}

/// Display name from a property bag. Numeric names are rendered as text.
#[must_use]
pub fn zone_name(bag: &JsonObject) -> Option<String> {
    match resolve_field(bag, ZONE_NAME_FIELDS)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The `(origin, destination)` pair a desire-line feature represents.
#[must_use]
pub fn line_pair(feature: &Feature) -> Option<ZonePair> {
    let bag = feature.properties.as_ref()?;
    let origin = resolve_field(bag, LINE_ORIGIN_FIELDS).and_then(zone_id_value)?;
    let destination = resolve_field(bag, LINE_DESTINATION_FIELDS).and_then(zone_id_value)?;
    Some(ZonePair::new(origin, destination))
}
