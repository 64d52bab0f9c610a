//! Bidirectional volume aggregation and linear visual scales.

use desire_lines_flow_models::FlowMetric;
use serde::Serialize;

use crate::FlowMatrix;

/// Largest combined two-way volume of `metric` over every stored pair.
///
/// Each unordered pair is visited from both directions; the combined value
/// is symmetric so the double visit does not change the result. Returns `0`
/// for an empty matrix.
#[must_use]
pub fn compute_max(matrix: &FlowMatrix, metric: FlowMetric) -> f64 {
    matrix
        .pairs()
        .map(|(pair, _)| matrix.combined(pair, metric))
        .fold(0.0, f64::max)
}

/// Linear map from a numeric domain onto a numeric range.
///
/// A degenerate domain (zero span) maps every input to the start of the
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    /// Creates a scale from `domain` onto `range`.
    #[must_use]
    pub const fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Input interval.
    #[must_use]
    pub const fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Output interval.
    #[must_use]
    pub const fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Maps `value` through the scale.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() || !value.is_finite() {
            return r0;
        }
        let t = (value - d0) / span;
        t.mul_add(r1 - r0, r0)
    }
}

/// Width and opacity scales for desire lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowScales {
    /// Volume to stroke width in pixels.
    pub width: LinearScale,
    /// Volume to stroke opacity in `[0, 1]`.
    pub opacity: LinearScale,
}

/// Builds the width scale `[0, max_value] -> [0, max_width]` and the
/// opacity scale `[0, max_value] -> [0, 1]`.
#[must_use]
pub const fn build_scales(max_value: f64, max_width: f64) -> FlowScales {
    FlowScales {
        width: LinearScale::new((0.0, max_value), (0.0, max_width)),
        opacity: LinearScale::new((0.0, max_value), (0.0, 1.0)),
    }
}
