//! Recomputes desire-line stroke styles for a metric selection.
//!
//! Any change to the selected trip type, mode, or maximum line width
//! reruns [`compute_max`] and [`build_scales`] and relabels every line.

use desire_lines_flow_models::{FlowMetric, TravelMode, TripType, ZonePair};
use serde::{Deserialize, Serialize};

use crate::{FlowMatrix, FlowScales, build_scales, compute_max};

/// Default upper bound of the width scale in pixels.
pub const DEFAULT_MAX_WIDTH: f64 = 10.0;

/// The user-controlled inputs of a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSelection {
    /// Metric column to draw.
    pub metric: FlowMetric,
    /// Width in pixels of the heaviest line.
    pub max_width: f64,
}

impl FlowSelection {
    /// Selection for a trip type and mode with the given width bound.
    #[must_use]
    pub const fn new(trip_type: TripType, mode: TravelMode, max_width: f64) -> Self {
        Self {
            metric: FlowMetric::new(trip_type, mode),
            max_width,
        }
    }
}

impl Default for FlowSelection {
    fn default() -> Self {
        Self {
            metric: FlowMetric::TOTAL,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

/// Stroke style of a single desire line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    /// Zone pair the line represents, if its properties carried one.
    pub pair: Option<ZonePair>,
    /// Combined two-way volume of the selected metric.
    pub volume: f64,
    /// Stroke width in pixels.
    pub width: f64,
    /// Stroke opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Output of one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restyle {
    /// Selection the styles were computed for.
    pub selection: FlowSelection,
    /// Largest combined volume in the matrix for the selected metric.
    pub max_volume: f64,
    /// Scales derived from `max_volume`.
    pub scales: FlowScales,
    /// One style per input line, in input order.
    pub styles: Vec<LineStyle>,
}

/// Restyles a set of lines identified by their zone pairs.
///
/// Lines without a pair, or whose pair is absent from the matrix in both
/// directions, get zero volume.
#[must_use]
pub fn restyle<I>(lines: I, matrix: &FlowMatrix, selection: FlowSelection) -> Restyle
where
    I: IntoIterator<Item = Option<ZonePair>>,
{
    let max_volume = compute_max(matrix, selection.metric);
    let scales = build_scales(max_volume, selection.max_width);

    let styles: Vec<LineStyle> = lines
        .into_iter()
        .map(|pair| {
            let volume = pair.map_or(0.0, |p| matrix.combined(p, selection.metric));
            LineStyle {
                pair,
                volume,
                width: scales.width.apply(volume),
                opacity: scales.opacity.apply(volume),
            }
        })
        .collect();

    log::debug!(
        "Restyled {} lines for {} (max volume {max_volume}, max width {})",
        styles.len(),
        selection.metric,
        selection.max_width,
    );

    Restyle {
        selection,
        max_volume,
        scales,
        styles,
    }
}
