#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone geometry normalization and desire-line resolution.
//!
//! Geometry sources arrive in several structural variants (plain feature
//! collections, literal geometry collections, arc-encoded topologies).
//! This crate flattens them into feature lists, names the zones, recovers
//! a known zone from a fallback polygon set by centroid proximity, and
//! resolves the desire-line features that connect zones.

pub mod centroid;
pub mod fields;
pub mod lines;
pub mod shape;
pub mod topology;
pub mod zones;

pub use centroid::{
    FallbackInjection, candidate_geometries, find_nearest, recover_zone, ring_centroid,
};
pub use lines::resolve_lines;
pub use shape::{CollectionShape, ObjectKey, classify, into_features};
pub use topology::Topology;
pub use zones::{ZoneLayer, normalize_zones, overlay_features, zone_bounds};

use thiserror::Error;

/// Errors that can occur while decoding zone or line geometry.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// JSON structure did not deserialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A topology referenced a missing arc or held malformed coordinates.
    #[error("Topology error: {message}")]
    Topology {
        /// Description of what went wrong.
        message: String,
    },

    /// The input matched none of the recognized geometry shapes.
    #[error("Structural mismatch: {message}")]
    StructuralMismatch {
        /// Description of what was found instead.
        message: String,
    },
}
