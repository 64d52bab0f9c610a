#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text and `GeoJSON` output for the `desire_lines` binary.

use desire_lines_flow_models::FlowMetric;
use desire_lines_scene::{FlowScene, PairSummary};
use geojson::{FeatureCollection, JsonObject, JsonValue};

/// Formats a volume with thousands separators (`1234567.5` becomes
/// `1,234,567.5`).
#[must_use]
pub fn format_volume(value: f64) -> String {
    let text = value.to_string();
    let (sign, unsigned) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    let (whole, fraction) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(w, f)| (w, Some(f)));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Tooltip-style description of a pair's two directions.
#[must_use]
pub fn describe_pair(summary: &PairSummary) -> String {
    let origin = summary
        .origin_name
        .clone()
        .unwrap_or_else(|| summary.pair.origin.to_string());
    let destination = summary
        .destination_name
        .clone()
        .unwrap_or_else(|| summary.pair.destination.to_string());

    format!(
        "{origin} → {destination} {}\n{destination} → {origin} {}",
        format_volume(summary.forward),
        format_volume(summary.backward)
    )
}

/// Scene overview: counts, the largest combined volume per metric, and
/// the map extent.
#[must_use]
pub fn summarize(scene: &FlowScene) -> Vec<String> {
    let mut lines = vec![
        format!("Flow pairs:       {}", scene.matrix.len()),
        format!("Zone features:    {}", scene.zones.features.len()),
        format!("Named zone ids:   {}", scene.zones.names.len()),
        format!("Overlay outlines: {}", scene.overlay.len()),
        format!("Desire lines:     {}", scene.lines.len()),
    ];

    if let Some(bounds) = scene.bounds() {
        lines.push(format!(
            "Bounds:           [{}, {}] to [{}, {}]",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        ));
    }

    let restyle = scene.styles();
    let (width, opacity) = (restyle.scales.width, restyle.scales.opacity);
    lines.push(format!(
        "Scales ({}):     width {:?} -> {:?}, opacity {:?} -> {:?}",
        restyle.selection.metric,
        width.domain(),
        width.range(),
        opacity.domain(),
        opacity.range()
    ));

    lines.push(String::new());
    lines.push("Maximum combined volume by metric:".to_string());
    for metric in FlowMetric::all() {
        let max = desire_lines_flow::compute_max(&scene.matrix, metric);
        lines.push(format!("  {metric}  {}", format_volume(max)));
    }

    lines
}

/// Every registered zone id with its name, in id order.
#[must_use]
pub fn list_zones(scene: &FlowScene) -> Vec<String> {
    scene
        .zones
        .names
        .iter()
        .map(|(id, name)| format!("{id:>6}  {name}"))
        .collect()
}

/// Desire lines with their current style written into each feature's
/// properties as `volume`, `stroke_width` and `stroke_opacity`.
#[must_use]
pub fn styled_collection(scene: &FlowScene) -> FeatureCollection {
    let features = scene
        .styled_lines()
        .map(|(feature, style)| {
            let mut feature = feature.clone();
            let properties = feature.properties.get_or_insert_with(JsonObject::new);
            properties.insert("volume".to_string(), JsonValue::from(style.volume));
            properties.insert("stroke_width".to_string(), JsonValue::from(style.width));
            properties.insert("stroke_opacity".to_string(), JsonValue::from(style.opacity));
            feature
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
