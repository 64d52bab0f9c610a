//! Scenario configuration.
//!
//! A scenario names the four input sources and the keys used to probe
//! them. The default layout is embedded at compile time; a TOML file on
//! disk can replace it.

use std::fmt;
use std::path::{Path, PathBuf};

use desire_lines_flow::style::{DEFAULT_MAX_WIDTH, FlowSelection};
use desire_lines_flow_models::FlowMetric;
use desire_lines_zone_models::FallbackZone;
use serde::{Deserialize, Serialize};

use crate::SceneError;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Placeholder substituted with the scenario name in source locations.
const SCENARIO_PLACEHOLDER: &str = "{scenario}";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_zone_object_key() -> String {
    "superdistricts".to_string()
}

fn default_line_object_key() -> String {
    "desirelines".to_string()
}

fn default_overlay_object_key() -> String {
    "counties".to_string()
}

const fn default_max_line_width() -> f64 {
    DEFAULT_MAX_WIDTH
}

/// Locations and probing keys for one scenario's inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Base directory relative locations resolve against.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Scenario name, substituted for `{scenario}` in locations.
    pub scenario: String,
    /// Tabular flow rows.
    pub flows: String,
    /// Primary zone topology.
    pub zones: String,
    /// Desire-line geometry candidates, tried in order.
    pub desire_lines: Vec<String>,
    /// Polygon collection used for overlay and zone recovery.
    pub fallback_zones: String,
    /// Preferred topology object holding the zone polygons.
    #[serde(default = "default_zone_object_key")]
    pub zone_object_key: String,
    /// Object holding the desire lines.
    #[serde(default = "default_line_object_key")]
    pub line_object_key: String,
    /// Object holding the county outlines.
    #[serde(default = "default_overlay_object_key")]
    pub overlay_object_key: String,
    /// Initial width in pixels of the heaviest line.
    #[serde(default = "default_max_line_width")]
    pub max_line_width: f64,
    /// Initially selected metric column.
    #[serde(default)]
    pub default_metric: FlowMetric,
    /// Zone recovered from the fallback set when the primary omits it.
    #[serde(default)]
    pub fallback_zone: FallbackZone,
}

impl ScenarioConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. It is a compile-time
    /// constant, so a failure is a development error caught by tests.
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded scenario config: {e}"))
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Toml`] if the text is not a valid configuration.
    pub fn parse(text: &str) -> Result<Self, SceneError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] if the file cannot be read or
    /// [`SceneError::Toml`] if it does not parse.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        log::info!("Loaded scenario config from {}", path.as_ref().display());
        Self::parse(&text)
    }

    /// Location of the flow table.
    #[must_use]
    pub fn flows_location(&self) -> Location {
        self.resolve(&self.flows)
    }

    /// Location of the primary zone topology.
    #[must_use]
    pub fn zones_location(&self) -> Location {
        self.resolve(&self.zones)
    }

    /// Desire-line candidates in fallback order.
    #[must_use]
    pub fn desire_line_locations(&self) -> Vec<Location> {
        self.desire_lines.iter().map(|raw| self.resolve(raw)).collect()
    }

    /// Location of the fallback polygon collection.
    #[must_use]
    pub fn fallback_zones_location(&self) -> Location {
        self.resolve(&self.fallback_zones)
    }

    /// Metric and width selection shown before any user input.
    #[must_use]
    pub const fn initial_selection(&self) -> FlowSelection {
        FlowSelection {
            metric: self.default_metric,
            max_width: self.max_line_width,
        }
    }

    fn resolve(&self, raw: &str) -> Location {
        Location::resolve(&raw.replace(SCENARIO_PLACEHOLDER, &self.scenario), &self.data_dir)
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Where a source is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// An `http://` or `https://` URL.
    Url(String),
}

impl Location {
    /// Classifies `raw`, joining relative paths onto `base`.
    #[must_use]
    pub fn resolve(raw: &str, base: &Path) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::Path(base.join(raw))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use desire_lines_flow_models::{TravelMode, TripType};

    use super::*;

    #[test]
    fn parses_embedded_config() {
        let config = ScenarioConfig::embedded();
        assert_eq!(config.zone_object_key, "superdistricts");
        assert_eq!(config.line_object_key, "desirelines");
        assert_eq!(config.overlay_object_key, "counties");
        assert_eq!(config.desire_lines.len(), 2);
        assert_eq!(config.default_metric, FlowMetric::TOTAL);
        assert!((config.max_line_width - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.fallback_zone, FallbackZone::default());
    }

    #[test]
    fn substitutes_scenario_into_locations() {
        let config = ScenarioConfig::embedded();
        assert_eq!(
            config.flows_location(),
            Location::Path(
                PathBuf::from("data")
                    .join(&config.scenario)
                    .join("Desirelines.csv")
            )
        );
    }

    #[test]
    fn keeps_urls_intact() {
        let base = Path::new("data");
        assert_eq!(
            Location::resolve("https://example.org/zones.json", base),
            Location::Url("https://example.org/zones.json".to_string())
        );
        assert_eq!(
            Location::resolve("zones.json", base),
            Location::Path(base.join("zones.json"))
        );
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = ScenarioConfig::parse(
            r#"
            scenario = "base"
            flows = "flows.csv"
            zones = "zones.topojson"
            desire_lines = ["lines.topojson"]
            fallback_zones = "counties.json"
            default_metric = "wrktrn"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.zone_object_key, "superdistricts");
        assert_eq!(
            config.initial_selection().metric,
            FlowMetric::new(TripType::Work, TravelMode::Transit)
        );
    }

    #[test]
    fn rejects_unknown_metric() {
        let result = ScenarioConfig::parse(
            r#"
            scenario = "base"
            flows = "flows.csv"
            zones = "zones.topojson"
            desire_lines = []
            fallback_zones = "counties.json"
            default_metric = "BIKE"
            "#,
        );
        assert!(matches!(result, Err(SceneError::Toml(_))));
    }
}
