//! Source fetching.
//!
//! The four inputs are fetched concurrently and must all arrive before
//! anything is computed. Only the desire-line source has a fallback: its
//! candidate locations are tried in order.

use geojson::JsonValue;

use crate::SceneError;
use crate::config::{Location, ScenarioConfig};

const USER_AGENT: &str = concat!("desire_lines/", env!("CARGO_PKG_VERSION"));

/// Raw contents of every input, before normalization.
#[derive(Debug, Clone)]
pub struct RawSources {
    /// Flow table text.
    pub flows: String,
    /// Primary zone topology.
    pub zones: JsonValue,
    /// Desire-line geometry, absent when every candidate failed.
    pub desire_lines: Option<JsonValue>,
    /// Fallback polygon collection.
    pub fallback_zones: JsonValue,
}

/// Reads sources from the filesystem or over HTTP.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    client: reqwest::Client,
}

impl SourceLoader {
    /// Creates a loader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SceneError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Fetches a source as text.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Fetch`] if the file cannot be read, the
    /// request fails, or the server answers with a non-success status.
    pub async fn fetch_text(
        &self,
        source_name: &str,
        location: &Location,
    ) -> Result<String, SceneError> {
        let fail = |reason: String| SceneError::Fetch {
            source_name: source_name.to_string(),
            location: location.to_string(),
            reason,
        };

        log::debug!("Fetching {source_name} from {location}");
        match location {
            Location::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| fail(e.to_string())),
            Location::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| fail(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(fail(format!("HTTP {status}")));
                }
                response.text().await.map_err(|e| fail(e.to_string()))
            }
        }
    }

    /// Fetches a source and parses it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Fetch`] if fetching fails or the body is not
    /// valid JSON.
    pub async fn fetch_json(
        &self,
        source_name: &str,
        location: &Location,
    ) -> Result<JsonValue, SceneError> {
        let text = self.fetch_text(source_name, location).await?;
        serde_json::from_str(&text).map_err(|e| SceneError::Fetch {
            source_name: source_name.to_string(),
            location: location.to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Fetches the first candidate that loads.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LineGeometryUnavailable`] once every
    /// candidate has failed.
    pub async fn fetch_first_json(
        &self,
        source_name: &str,
        candidates: &[Location],
    ) -> Result<(Location, JsonValue), SceneError> {
        for location in candidates {
            match self.fetch_json(source_name, location).await {
                Ok(value) => {
                    log::info!("Loaded {source_name} from {location}");
                    return Ok((location.clone(), value));
                }
                Err(e) => log::warn!("{e}; trying next location"),
            }
        }
        Err(SceneError::LineGeometryUnavailable {
            attempted: candidates.len(),
        })
    }

    /// Fetches every input of a scenario concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Fetch`] if the flow table, the zone topology,
    /// or the fallback collection fails to load. Exhausting the desire-line
    /// candidates is not an error; the lines are simply absent.
    pub async fn load(&self, config: &ScenarioConfig) -> Result<RawSources, SceneError> {
        let flows_location = config.flows_location();
        let zones_location = config.zones_location();
        let line_locations = config.desire_line_locations();
        let fallback_location = config.fallback_zones_location();

        let desire_lines = async {
            match self.fetch_first_json("desire lines", &line_locations).await {
                Ok((_, value)) => Ok(Some(value)),
                Err(e @ SceneError::LineGeometryUnavailable { .. }) => {
                    log::warn!("{e}; drawing no lines");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        };

        let (flows, zones, desire_lines, fallback_zones) = tokio::try_join!(
            self.fetch_text("flow table", &flows_location),
            self.fetch_json("zone topology", &zones_location),
            desire_lines,
            self.fetch_json("fallback zones", &fallback_location),
        )?;

        Ok(RawSources {
            flows,
            zones,
            desire_lines,
            fallback_zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "desire_lines_source_{name}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_for(dir: PathBuf) -> ScenarioConfig {
        ScenarioConfig {
            data_dir: dir,
            scenario: "base".to_string(),
            flows: "{scenario}.csv".to_string(),
            zones: "zones.json".to_string(),
            desire_lines: vec!["preferred.json".to_string(), "alternate.json".to_string()],
            fallback_zones: "counties.json".to_string(),
            ..ScenarioConfig::embedded()
        }
    }

    fn write_common(dir: &std::path::Path) {
        std::fs::write(dir.join("base.csv"), "ORIG,DEST,ALLALL\n1,2,5\n").unwrap();
        std::fs::write(
            dir.join("zones.json"),
            json!({ "type": "FeatureCollection", "features": [] }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join("counties.json"),
            json!({ "type": "FeatureCollection", "features": [] }).to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn falls_back_to_alternate_line_source() {
        let dir = fixture_dir("fallback");
        write_common(&dir);
        let _ = std::fs::remove_file(dir.join("preferred.json"));
        std::fs::write(
            dir.join("alternate.json"),
            json!({ "type": "FeatureCollection", "features": [] }).to_string(),
        )
        .unwrap();

        let loader = SourceLoader::new().unwrap();
        let config = config_for(dir.clone());
        let (location, _) = loader
            .fetch_first_json("desire lines", &config.desire_line_locations())
            .await
            .unwrap();
        assert_eq!(location, Location::Path(dir.join("alternate.json")));

        let sources = loader.load(&config).await.unwrap();
        assert!(sources.desire_lines.is_some());
        assert!(sources.flows.starts_with("ORIG,DEST"));
    }

    #[tokio::test]
    async fn exhausted_line_sources_are_not_fatal() {
        let dir = fixture_dir("exhausted");
        write_common(&dir);
        let _ = std::fs::remove_file(dir.join("preferred.json"));
        std::fs::write(dir.join("alternate.json"), "not json").unwrap();

        let loader = SourceLoader::new().unwrap();
        let config = config_for(dir);
        assert!(matches!(
            loader
                .fetch_first_json("desire lines", &config.desire_line_locations())
                .await,
            Err(SceneError::LineGeometryUnavailable { attempted: 2 })
        ));

        let sources = loader.load(&config).await.unwrap();
        assert!(sources.desire_lines.is_none());
    }

    #[tokio::test]
    async fn missing_required_source_aborts() {
        let dir = fixture_dir("missing");
        write_common(&dir);
        std::fs::remove_file(dir.join("zones.json")).unwrap();

        let loader = SourceLoader::new().unwrap();
        let result = loader.load(&config_for(dir)).await;
        let Err(SceneError::Fetch { source_name, .. }) = result else {
            panic!("expected a fetch failure");
        };
        assert_eq!(source_name, "zone topology");
    }
}
