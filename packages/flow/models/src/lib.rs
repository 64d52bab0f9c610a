#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Origin-destination flow types.
//!
//! Defines the zone identifiers, the trip-type and travel-mode axes, the
//! twelve metric columns they combine into, and the per-pair
//! [`FlowRecord`] stored in a flow matrix.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Numeric identifier of a geographic zone (traffic analysis district or
/// county).
pub type ZoneId = i64;

/// Parses a zone id, accepting integral floats such as `"12.0"`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_zone_id(raw: &str) -> Option<ZoneId> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<ZoneId>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as ZoneId)
}

/// An ordered `(origin, destination)` pair of zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZonePair {
    /// Zone the trips start in.
    pub origin: ZoneId,
    /// Zone the trips end in.
    pub destination: ZoneId,
}

impl ZonePair {
    /// Creates a new ordered pair.
    #[must_use]
    pub const fn new(origin: ZoneId, destination: ZoneId) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Returns the same pair travelled in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            origin: self.destination,
            destination: self.origin,
        }
    }

    /// Whether origin and destination are the same zone.
    #[must_use]
    pub const fn is_self_pair(self) -> bool {
        self.origin == self.destination
    }
}

/// Trip purpose axis of a metric column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TripType {
    /// Home-based work trips.
    #[serde(rename = "WRK")]
    #[strum(serialize = "WRK")]
    Work,
    /// Every trip purpose other than work.
    #[serde(rename = "NWK")]
    #[strum(serialize = "NWK")]
    NonWork,
    /// All trip purposes combined.
    #[serde(rename = "ALL")]
    #[strum(serialize = "ALL")]
    All,
}

impl TripType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Work, Self::NonWork, Self::All]
    }
}

/// Vehicle mode axis of a metric column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TravelMode {
    /// Single-occupancy vehicle.
    #[serde(rename = "SOV")]
    #[strum(serialize = "SOV")]
    SingleOccupancy,
    /// High-occupancy vehicle (carpool).
    #[serde(rename = "HOV")]
    #[strum(serialize = "HOV")]
    HighOccupancy,
    /// Public transit.
    #[serde(rename = "TRN")]
    #[strum(serialize = "TRN")]
    Transit,
    /// All modes combined.
    #[serde(rename = "ALL")]
    #[strum(serialize = "ALL")]
    All,
}

impl TravelMode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::SingleOccupancy,
            Self::HighOccupancy,
            Self::Transit,
            Self::All,
        ]
    }
}

/// Column names in metric index order (`trip_type * 4 + mode`).
const COLUMNS: [&str; FlowMetric::COUNT] = [
    "WRKSOV", "WRKHOV", "WRKTRN", "WRKALL", "NWKSOV", "NWKHOV", "NWKTRN", "NWKALL", "ALLSOV",
    "ALLHOV", "ALLTRN", "ALLALL",
];

/// One of the twelve trip-count columns: a trip type crossed with a mode.
///
/// The column name is the trip-type code followed by the mode code, e.g.
/// `WRKSOV` or `ALLALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowMetric {
    /// Trip purpose.
    pub trip_type: TripType,
    /// Vehicle mode.
    pub mode: TravelMode,
}

impl FlowMetric {
    /// Number of metric columns.
    pub const COUNT: usize = 12;

    /// Every trip type and mode combined.
    pub const TOTAL: Self = Self::new(TripType::All, TravelMode::All);

    /// Creates a metric from its two axes.
    #[must_use]
    pub const fn new(trip_type: TripType, mode: TravelMode) -> Self {
        Self { trip_type, mode }
    }

    /// Position of this metric inside a [`FlowRecord`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.trip_type as usize * TravelMode::all().len() + self.mode as usize
    }

    /// Tabular column name of this metric (e.g. `"NWKTRN"`).
    #[must_use]
    pub const fn column(self) -> &'static str {
        COLUMNS[self.index()]
    }

    /// Returns all twelve metrics in index order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        TripType::all()
            .iter()
            .flat_map(|trip_type| {
                TravelMode::all()
                    .iter()
                    .map(move |mode| Self::new(*trip_type, *mode))
            })
            .collect()
    }
}

impl Default for FlowMetric {
    fn default() -> Self {
        Self::TOTAL
    }
}

impl std::fmt::Display for FlowMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Error returned when a string does not name one of the twelve metric
/// columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMetricError {
    /// The column name that was provided.
    pub column: String,
}

impl std::fmt::Display for InvalidMetricError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid metric column '{}': expected a trip type (WRK, NWK, ALL) \
             followed by a mode (SOV, HOV, TRN, ALL)",
            self.column
        )
    }
}

impl std::error::Error for InvalidMetricError {}

impl FromStr for FlowMetric {
    type Err = InvalidMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidMetricError {
            column: s.to_string(),
        };
        let column = s.trim();
        if column.len() != 6 || !column.is_ascii() {
            return Err(err());
        }
        let (trip, mode) = column.split_at(3);
        Ok(Self::new(
            trip.parse().map_err(|_| err())?,
            mode.parse().map_err(|_| err())?,
        ))
    }
}

impl Serialize for FlowMetric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

impl<'de> Deserialize<'de> for FlowMetric {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let column = String::deserialize(deserializer)?;
        column.parse().map_err(serde::de::Error::custom)
    }
}

/// Trip counts for one ordered zone pair, one value per [`FlowMetric`].
///
/// Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowRecord {
    values: [f64; FlowMetric::COUNT],
}

impl FlowRecord {
    /// Builds a record by asking `value` for every metric.
    #[must_use]
    pub fn from_fn(mut value: impl FnMut(FlowMetric) -> f64) -> Self {
        let mut values = [0.0; FlowMetric::COUNT];
        for metric in FlowMetric::all() {
            values[metric.index()] = value(metric);
        }
        Self { values }
    }

    /// Trip count for a single metric.
    #[must_use]
    pub const fn get(&self, metric: FlowMetric) -> f64 {
        self.values[metric.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_match_axes() {
        for metric in FlowMetric::all() {
            let expected = format!("{}{}", metric.trip_type, metric.mode);
            assert_eq!(metric.column(), expected);
        }
    }

    #[test]
    fn all_metrics_have_distinct_indices() {
        let mut seen = [false; FlowMetric::COUNT];
        for metric in FlowMetric::all() {
            assert!(!seen[metric.index()], "duplicate index for {metric}");
            seen[metric.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn parses_column_names_case_insensitively() {
        let metric: FlowMetric = "nwkTrn".parse().unwrap();
        assert_eq!(metric, FlowMetric::new(TripType::NonWork, TravelMode::Transit));
        assert_eq!("ALLALL".parse::<FlowMetric>().unwrap(), FlowMetric::TOTAL);
    }

    #[test]
    fn rejects_unknown_columns() {
        assert!("ORIG".parse::<FlowMetric>().is_err());
        assert!("WRKBUS".parse::<FlowMetric>().is_err());
        assert!("".parse::<FlowMetric>().is_err());
    }

    #[test]
    fn record_returns_value_per_metric() {
        let record = FlowRecord::from_fn(|metric| {
            #[allow(clippy::cast_precision_loss)]
            let value = metric.index() as f64;
            value
        });
        let hov = FlowMetric::new(TripType::Work, TravelMode::HighOccupancy);
        assert!((record.get(hov) - 1.0).abs() < f64::EPSILON);
        assert!((record.get(FlowMetric::TOTAL) - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_integral_zone_ids() {
        assert_eq!(parse_zone_id("12.0"), Some(12));
        assert_eq!(parse_zone_id(" 7 "), Some(7));
        assert_eq!(parse_zone_id("-3"), Some(-3));
        assert_eq!(parse_zone_id("1.5"), None);
        assert_eq!(parse_zone_id("NaN"), None);
        assert_eq!(parse_zone_id(""), None);
    }

    #[test]
    fn reversed_pair_swaps_zones() {
        let pair = ZonePair::new(1, 2);
        assert_eq!(pair.reversed(), ZonePair::new(2, 1));
        assert!(!pair.is_self_pair());
        assert!(ZonePair::new(3, 3).is_self_pair());
    }
}
