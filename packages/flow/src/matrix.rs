//! Sparse origin-destination flow matrix.
//!
//! Rows are keyed by `ORIG`/`DEST` zone ids and carry the twelve metric
//! columns. Self-pairs are never stored, duplicate pairs are
//! last-write-wins, and a missing direction of a pair reads as zero.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use desire_lines_flow_models::{FlowMetric, FlowRecord, ZoneId, ZonePair, parse_zone_id};

use crate::FlowError;

/// Column holding the origin zone id.
pub const ORIGIN_COLUMN: &str = "ORIG";
/// Column holding the destination zone id.
pub const DESTINATION_COLUMN: &str = "DEST";

/// Two-level mapping `origin -> destination -> FlowRecord`.
///
/// Built once per load and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowMatrix {
    flows: BTreeMap<ZoneId, BTreeMap<ZoneId, FlowRecord>>,
}

impl FlowMatrix {
    /// Stores `record` for `pair`, overwriting any earlier record.
    ///
    /// Returns `false` (and stores nothing) for a self-pair.
    fn insert(&mut self, pair: ZonePair, record: FlowRecord) -> bool {
        if pair.is_self_pair() {
            return false;
        }
        self.flows
            .entry(pair.origin)
            .or_default()
            .insert(pair.destination, record);
        true
    }

    /// Record stored for the ordered pair, if any.
    #[must_use]
    pub fn get(&self, pair: ZonePair) -> Option<&FlowRecord> {
        self.flows.get(&pair.origin)?.get(&pair.destination)
    }

    /// Volume of one metric in one direction, zero when the pair is absent.
    #[must_use]
    pub fn volume(&self, pair: ZonePair, metric: FlowMetric) -> f64 {
        self.get(pair).map_or(0.0, |record| record.get(metric))
    }

    /// `(origin -> destination, destination -> origin)` volumes of a metric.
    #[must_use]
    pub fn directional(&self, pair: ZonePair, metric: FlowMetric) -> (f64, f64) {
        (
            self.volume(pair, metric),
            self.volume(pair.reversed(), metric),
        )
    }

    /// Sum of both directions of a pair. Symmetric in the pair's order.
    #[must_use]
    pub fn combined(&self, pair: ZonePair, metric: FlowMetric) -> f64 {
        let (forward, backward) = self.directional(pair, metric);
        forward + backward
    }

    /// Iterates every stored ordered pair with its record.
    pub fn pairs(&self) -> impl Iterator<Item = (ZonePair, &FlowRecord)> {
        self.flows.iter().flat_map(|(origin, destinations)| {
            destinations
                .iter()
                .map(move |(destination, record)| (ZonePair::new(*origin, *destination), record))
        })
    }

    /// Number of stored ordered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flows.values().map(BTreeMap::len).sum()
    }

    /// Whether no pair is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flows.values().all(BTreeMap::is_empty)
    }
}

impl FromIterator<(ZonePair, FlowRecord)> for FlowMatrix {
    fn from_iter<T: IntoIterator<Item = (ZonePair, FlowRecord)>>(iter: T) -> Self {
        let mut matrix = Self::default();
        for (pair, record) in iter {
            matrix.insert(pair, record);
        }
        matrix
    }
}

/// Result of reading a flow table.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    /// The parsed matrix.
    pub matrix: FlowMatrix,
    /// Data rows read from the table.
    pub rows: u64,
    /// Rows discarded because origin equals destination.
    pub self_pairs: u64,
    /// Rows skipped because the origin or destination was unusable.
    pub malformed: u64,
}

/// Resolves header names to column positions once per table.
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.trim().to_ascii_uppercase(), i))
            .collect();
        Self { positions }
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.positions.get(column).and_then(|i| record.get(*i))
    }
}

/// Reads a CSV flow table into a [`FlowMatrix`].
///
/// Malformed rows are logged and skipped rather than aborting the load.
///
/// # Errors
///
/// Returns [`FlowError`] if the CSV itself cannot be read.
pub fn read_flows<R: Read>(reader: R) -> Result<FlowTable, FlowError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::new(reader.headers()?);
    for column in [ORIGIN_COLUMN, DESTINATION_COLUMN] {
        if !columns.positions.contains_key(column) {
            log::warn!("Flow table has no {column} column; every row will be skipped");
        }
    }

    let mut table = FlowTable::default();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        table.rows += 1;
        // Header occupies line 1.
        let line = record.position().map_or(i as u64 + 2, csv::Position::line);

        match parse_row(&columns, &record, line) {
            Ok((pair, flows)) => {
                if !table.matrix.insert(pair, flows) {
                    table.self_pairs += 1;
                }
            }
            Err(e) => {
                log::warn!("Skipping flow row: {e}");
                table.malformed += 1;
            }
        }
    }

    log::info!(
        "Parsed {} flow pairs from {} rows ({} self-pairs, {} malformed)",
        table.matrix.len(),
        table.rows,
        table.self_pairs,
        table.malformed,
    );

    Ok(table)
}

fn parse_row(
    columns: &ColumnIndex,
    record: &csv::StringRecord,
    line: u64,
) -> Result<(ZonePair, FlowRecord), FlowError> {
    let zone = |column: &str| -> Result<ZoneId, FlowError> {
        let raw = columns
            .field(record, column)
            .ok_or_else(|| FlowError::MalformedRow {
                line,
                message: format!("missing {column} field"),
            })?;
        parse_zone_id(raw).ok_or_else(|| FlowError::MalformedRow {
            line,
            message: format!("{column} value '{raw}' is not an integer zone id"),
        })
    };

    let pair = ZonePair::new(zone(ORIGIN_COLUMN)?, zone(DESTINATION_COLUMN)?);
    let flows = FlowRecord::from_fn(|metric| {
        columns
            .field(record, metric.column())
            .map_or(0.0, parse_metric)
    });

    Ok((pair, flows))
}

/// Parses a metric cell. Missing, blank, or non-numeric cells become `0`.
#[must_use]
pub fn parse_metric(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
