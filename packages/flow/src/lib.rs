#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Origin-destination flow matrix and desire-line scaling.
//!
//! Parses tabular origin/destination rows into a sparse [`FlowMatrix`],
//! aggregates bidirectional volume for a selected metric, and derives the
//! linear width and opacity scales used to draw desire lines.

pub mod matrix;
pub mod scale;
pub mod style;

pub use matrix::{FlowMatrix, FlowTable, read_flows};
pub use scale::{FlowScales, LinearScale, build_scales, compute_max};
pub use style::{FlowSelection, LineStyle, Restyle, restyle};

use thiserror::Error;

/// Errors that can occur while reading flow tables.
#[derive(Debug, Error)]
pub enum FlowError {
    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while reading the table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row is missing its origin or destination, or they are not integers.
    #[error("Malformed row at line {line}: {message}")]
    MalformedRow {
        /// 1-based line number in the source table.
        line: u64,
        /// Description of what went wrong.
        message: String,
    },
}
