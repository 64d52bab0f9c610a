#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone naming and geometry-source definition types.
//!
//! Holds the id-to-name lookup built while normalizing zone geometry, the
//! ordered candidate property names probed for each logical attribute,
//! and the definition of the well-known zone recovered from a fallback
//! geometry set when the primary source omits it.

use std::collections::BTreeMap;

use desire_lines_flow_models::ZoneId;
use serde::{Deserialize, Serialize};

/// Property names holding a zone's identifier, in priority order.
pub const ZONE_ID_FIELDS: &[&str] = &["id", "LOGRECNO", "GEOID", "OBJECTID"];

/// Property names holding a zone's display name, in priority order.
pub const ZONE_NAME_FIELDS: &[&str] = &["name", "NAME"];

/// Property names holding a desire line's origin zone.
pub const LINE_ORIGIN_FIELDS: &[&str] = &["o", "ORIG", "origin"];

/// Property names holding a desire line's destination zone.
pub const LINE_DESTINATION_FIELDS: &[&str] = &["d", "DEST", "destination"];

/// Mapping from zone id to display name.
///
/// A zone may be registered twice: under its explicit source identifier
/// and under its 1-based position in the source, so consumers using either
/// scheme resolve the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameLookup {
    names: BTreeMap<ZoneId, String>,
}

impl NameLookup {
    /// Registers `name` under `id`, replacing any earlier name.
    pub fn register(&mut self, id: ZoneId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Display name registered for `id`.
    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Number of distinct registered ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Next sequential index after every registered id, `len() + 1`.
    #[must_use]
    pub fn next_index(&self) -> ZoneId {
        ZoneId::try_from(self.names.len()).map_or(ZoneId::MAX, |len| len + 1)
    }

    /// Whether any registered name contains `needle`, ignoring case.
    #[must_use]
    pub fn contains_name(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.names
            .values()
            .any(|name| name.to_lowercase().contains(&needle))
    }

    /// Iterates `(id, name)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

/// A well-known zone that the primary geometry source sometimes omits.
///
/// When no registered name contains [`FallbackZone::name`], the fallback
/// geometry set is searched for the polygon whose centroid lies nearest to
/// `(lon, lat)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackZone {
    /// Display name, also the case-insensitive presence check.
    pub name: String,
    /// Longitude of the approximate zone centroid.
    pub lon: f64,
    /// Latitude of the approximate zone centroid.
    pub lat: f64,
    /// Identifier written to the injected feature's `LOGRECNO` property.
    pub identifier: ZoneId,
    /// Value written to the injected feature's `GEOID` property.
    pub geoid: String,
}

impl Default for FallbackZone {
    fn default() -> Self {
        Self {
            name: "Dawson".to_string(),
            lon: -84.14,
            lat: 34.43,
            identifier: 5874,
            geoid: "Dawson".to_string(),
        }
    }
}
