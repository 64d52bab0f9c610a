#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scenario loading and desire-line scene assembly.
//!
//! Fetches the flow table, zone topology, desire-line geometry, and
//! fallback polygon collection for a scenario, then normalizes them into a
//! [`FlowScene`] that a renderer can draw and restyle.

pub mod config;
pub mod scene;
pub mod source;

pub use config::{Location, ScenarioConfig};
pub use scene::{FlowScene, PairSummary};
pub use source::{RawSources, SourceLoader};

use desire_lines_flow::FlowError;
use thiserror::Error;

/// Errors that can occur while loading a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// HTTP client setup failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration did not parse.
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The flow table could not be read.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A required source failed to load.
    #[error("Failed to load {source_name} from {location}: {reason}")]
    Fetch {
        /// Which input failed.
        source_name: String,
        /// Where it was read from.
        location: String,
        /// Underlying failure.
        reason: String,
    },

    /// Every desire-line candidate failed to load.
    #[error("Desire-line geometry unavailable after {attempted} locations")]
    LineGeometryUnavailable {
        /// Number of candidate locations tried.
        attempted: usize,
    },
}
