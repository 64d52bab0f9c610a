//! The assembled desire-line scene handed to a renderer.

use desire_lines_flow::{FlowMatrix, FlowSelection, LineStyle, Restyle, read_flows, restyle};
use desire_lines_flow_models::{FlowMetric, ZoneId, ZonePair};
use desire_lines_zone::fields::line_pair;
use desire_lines_zone::{
    ZoneLayer, candidate_geometries, normalize_zones, overlay_features, recover_zone,
    resolve_lines, zone_bounds,
};
use geojson::Feature;

use crate::SceneError;
use crate::config::ScenarioConfig;
use crate::source::{RawSources, SourceLoader};

/// Normalized inputs plus the current line styles.
///
/// Everything except the styles is fixed after assembly; only
/// [`FlowScene::recompute`] changes state.
#[derive(Debug, Clone)]
pub struct FlowScene {
    /// Sparse origin-destination flows.
    pub matrix: FlowMatrix,
    /// Zone polygons and names, including any recovered zone.
    pub zones: ZoneLayer,
    /// County outlines drawn over the zones.
    pub overlay: Vec<Feature>,
    /// Desire-line features.
    pub lines: Vec<Feature>,
    pairs: Vec<Option<ZonePair>>,
    current: Restyle,
}

/// Directional volumes between two zones, with their names.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSummary {
    /// The pair as requested.
    pub pair: ZonePair,
    /// Name of the origin zone.
    pub origin_name: Option<String>,
    /// Name of the destination zone.
    pub destination_name: Option<String>,
    /// Origin to destination volume.
    pub forward: f64,
    /// Destination to origin volume.
    pub backward: f64,
}

impl PairSummary {
    /// Combined two-way volume.
    #[must_use]
    pub fn combined(&self) -> f64 {
        self.forward + self.backward
    }
}

impl FlowScene {
    /// Loads every source of `config` and assembles the scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Fetch`] if a required source fails to load or
    /// [`SceneError::Flow`] if the flow table cannot be read.
    pub async fn load(config: &ScenarioConfig) -> Result<Self, SceneError> {
        let loader = SourceLoader::new()?;
        let sources = loader.load(config).await?;
        Self::assemble(&sources, config)
    }

    /// Normalizes loaded sources into a scene styled for the configured
    /// initial selection.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Flow`] if the flow table cannot be read.
    pub fn assemble(sources: &RawSources, config: &ScenarioConfig) -> Result<Self, SceneError> {
        let table = read_flows(sources.flows.as_bytes())?;

        let mut zones = normalize_zones(&sources.zones, &config.zone_object_key);
        let candidates = candidate_geometries(&sources.fallback_zones);
        if let Some(injection) = recover_zone(&zones, &candidates, &config.fallback_zone) {
            zones.append(injection);
        }

        let overlay = overlay_features(
            &sources.zones,
            Some(&sources.fallback_zones),
            &config.overlay_object_key,
        );
        let lines = resolve_lines(sources.desire_lines.as_ref(), &config.line_object_key);
        let pairs: Vec<_> = lines.iter().map(line_pair).collect();

        let unpaired = pairs.iter().filter(|pair| pair.is_none()).count();
        if unpaired > 0 {
            log::warn!("{unpaired} desire lines carry no origin/destination pair");
        }

        let current = restyle(
            pairs.iter().copied(),
            &table.matrix,
            config.initial_selection(),
        );

        log::info!(
            "Scene ready: {} flow pairs, {} zones, {} overlay outlines, {} lines",
            table.matrix.len(),
            zones.features.len(),
            overlay.len(),
            lines.len()
        );

        Ok(Self {
            matrix: table.matrix,
            zones,
            overlay,
            lines,
            pairs,
            current,
        })
    }

    /// Restyles every line for a new selection.
    pub fn recompute(&mut self, selection: FlowSelection) -> &Restyle {
        log::debug!(
            "Recomputing styles for {} at max width {}",
            selection.metric,
            selection.max_width
        );
        self.current = restyle(self.pairs.iter().copied(), &self.matrix, selection);
        &self.current
    }

    /// Styles from the most recent computation.
    #[must_use]
    pub const fn styles(&self) -> &Restyle {
        &self.current
    }

    /// Each line feature with its current style.
    pub fn styled_lines(&self) -> impl Iterator<Item = (&Feature, &LineStyle)> {
        self.lines.iter().zip(&self.current.styles)
    }

    /// Display name of a zone.
    #[must_use]
    pub fn zone_name(&self, id: ZoneId) -> Option<&str> {
        self.zones.names.get(id)
    }

    /// Directional volumes and names for a pair.
    #[must_use]
    pub fn pair_summary(&self, pair: ZonePair, metric: FlowMetric) -> PairSummary {
        let (forward, backward) = self.matrix.directional(pair, metric);
        PairSummary {
            pair,
            origin_name: self.zone_name(pair.origin).map(str::to_string),
            destination_name: self.zone_name(pair.destination).map(str::to_string),
            forward,
            backward,
        }
    }

    /// Bounding rectangle of the zone polygons.
    #[must_use]
    pub fn bounds(&self) -> Option<geo::Rect<f64>> {
        zone_bounds(&self.zones.features)
    }
}

#[cfg(test)]
mod tests {
    use desire_lines_flow_models::{TravelMode, TripType};
    use desire_lines_zone_models::FallbackZone;
    use serde_json::json;

    use super::*;

    fn sources() -> RawSources {
        let zone = FallbackZone::default();
        RawSources {
            flows: "ORIG,DEST,WRKSOV,ALLALL\n1,2,7,100\n2,1,3,50\n3,3,9,999\n".to_string(),
            zones: json!({
                "type": "Topology",
                "arcs": [
                    [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
                    [[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]
                ],
                "objects": {
                    "superdistricts": {
                        "type": "GeometryCollection",
                        "geometries": [
                            { "type": "Polygon", "arcs": [[0]], "properties": { "id": 1, "name": "Buckhead" } },
                            { "type": "Polygon", "arcs": [[1]], "properties": { "id": 2, "name": "Midtown" } }
                        ]
                    }
                }
            }),
            desire_lines: Some(json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "geometry": { "type": "LineString", "coordinates": [[0.5, 0.5], [2.5, 2.5]] },
                        "properties": { "o": 1, "d": 2 }
                    },
                    {
                        "type": "Feature",
                        "geometry": { "type": "LineString", "coordinates": [[0.5, 0.5], [9.0, 9.0]] },
                        "properties": {}
                    }
                ]
            })),
            fallback_zones: json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "geometry": { "type": "Polygon", "coordinates": [[
                            [zone.lon - 0.1, zone.lat - 0.1],
                            [zone.lon + 0.1, zone.lat - 0.1],
                            [zone.lon + 0.1, zone.lat + 0.1],
                            [zone.lon - 0.1, zone.lat + 0.1]
                        ]] },
                        "properties": { "NAME": "Dawson" }
                    },
                    {
                        "type": "Feature",
                        "geometry": { "type": "Polygon", "coordinates": [[[-84.5, 33.5], [-84.3, 33.5], [-84.3, 33.7]]] },
                        "properties": { "NAME": "Fulton" }
                    }
                ]
            }),
        }
    }

    #[test]
    fn assembles_every_part() {
        let scene = FlowScene::assemble(&sources(), &ScenarioConfig::embedded()).unwrap();

        assert_eq!(scene.matrix.len(), 2);
        assert_eq!(scene.lines.len(), 2);
        assert_eq!(scene.overlay.len(), 2);

        assert_eq!(scene.zones.features.len(), 3);
        assert_eq!(scene.zone_name(3), Some("Dawson"));
        assert_eq!(scene.zone_name(2), Some("Midtown"));
    }

    #[test]
    fn initial_styles_use_total_volume() {
        let scene = FlowScene::assemble(&sources(), &ScenarioConfig::embedded()).unwrap();
        let styles = scene.styles();
        assert!((styles.max_volume - 150.0).abs() < f64::EPSILON);

        let (_, first) = scene.styled_lines().next().unwrap();
        assert!((first.width - 10.0).abs() < f64::EPSILON);
        assert!((first.opacity - 1.0).abs() < f64::EPSILON);

        let (_, unpaired) = scene.styled_lines().nth(1).unwrap();
        assert!(unpaired.width.abs() < f64::EPSILON);
    }

    #[test]
    fn recompute_follows_selection() {
        let mut scene = FlowScene::assemble(&sources(), &ScenarioConfig::embedded()).unwrap();
        let styles = scene.recompute(FlowSelection::new(
            TripType::Work,
            TravelMode::SingleOccupancy,
            4.0,
        ));
        assert!((styles.max_volume - 10.0).abs() < f64::EPSILON);
        assert!((styles.styles[0].width - 4.0).abs() < f64::EPSILON);

        let styles = scene.recompute(FlowSelection::new(TripType::Work, TravelMode::Transit, 4.0));
        assert!(styles.max_volume.abs() < f64::EPSILON);
        assert!(styles.styles.iter().all(|style| style.width.abs() < f64::EPSILON));
    }

    #[test]
    fn summarizes_pairs_with_names() {
        let scene = FlowScene::assemble(&sources(), &ScenarioConfig::embedded()).unwrap();
        let summary = scene.pair_summary(ZonePair::new(2, 1), FlowMetric::TOTAL);
        assert_eq!(summary.origin_name.as_deref(), Some("Midtown"));
        assert_eq!(summary.destination_name.as_deref(), Some("Buckhead"));
        assert!((summary.forward - 50.0).abs() < f64::EPSILON);
        assert!((summary.backward - 100.0).abs() < f64::EPSILON);
        assert!((summary.combined() - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_include_recovered_zone() {
        let scene = FlowScene::assemble(&sources(), &ScenarioConfig::embedded()).unwrap();
        let bounds = scene.bounds().unwrap();
        assert!(bounds.min().x < -84.0);
        assert!((bounds.max().x - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_lines_leave_an_empty_scene() {
        let mut raw = sources();
        raw.desire_lines = None;
        let scene = FlowScene::assemble(&raw, &ScenarioConfig::embedded()).unwrap();
        assert!(scene.lines.is_empty());
        assert!(scene.styles().styles.is_empty());
    }
}
