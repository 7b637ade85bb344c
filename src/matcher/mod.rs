//! Exact-key reconciliation of a candidate table against a master table.
//!
//! Every candidate row is left-joined against all master rows sharing its
//! normalized key. A candidate with several partners produces one matched
//! row per partner, and the summary counts those joined pairs.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::column::ColumnRef;
use crate::error::{Result, ToolError};
use crate::model::{Row, Table};
use crate::normalize::{normalize_cell, normalize_text};

/// Column positions used to read names from both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchColumns {
    pub master_name: ColumnRef,
    pub master_surname: ColumnRef,
    pub candidate_name: ColumnRef,
}

impl Default for MatchColumns {
    fn default() -> Self {
        Self {
            master_name: ColumnRef::from_index(0),
            master_surname: ColumnRef::from_index(1),
            candidate_name: ColumnRef::from_index(4),
        }
    }
}

/// Tunables for the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    /// When `false`, empty keys never join: such candidates are reported as
    /// unmatched and empty-key master rows are not indexed.
    pub join_empty_keys: bool,
}

/// A master row reduced to its display form and comparison key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRecord {
    pub row_index: usize,
    pub original_display: String,
    pub normalized_key: String,
}

impl MasterRecord {
    /// Builds the record from the name and surname cells of `row`.
    pub fn from_row(row: &Row, name: ColumnRef, surname: ColumnRef) -> Self {
        let name = row.cell(name.index()).display_text();
        let surname = row.cell(surname.index()).display_text();
        let normalized_key = normalize_text(&format!("{name}{surname}"));
        Self {
            row_index: row.index,
            original_display: format!("{name} {surname}"),
            normalized_key,
        }
    }
}

/// A candidate row reduced to its display form and comparison key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub row_index: usize,
    pub original_display: String,
    pub normalized_key: String,
}

impl CandidateRecord {
    /// Builds the record from the name cell of `row`.
    pub fn from_row(row: &Row, name: ColumnRef) -> Self {
        let cell = row.cell(name.index());
        Self {
            row_index: row.index,
            original_display: cell.display_text(),
            normalized_key: normalize_cell(cell),
        }
    }
}

/// One joined (candidate, master) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    pub candidate_display: String,
    pub candidate_key: String,
    pub master_display: String,
}

/// A candidate without any master partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedRow {
    pub candidate_display: String,
    pub candidate_key: String,
}

/// Counts derived from the matched and unmatched partitions.
///
/// Serializes with an extra `ratio_percent` field holding
/// [`Summary::ratio_percent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "SummaryJson")]
pub struct Summary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ratio: f64,
}

impl Summary {
    /// Derives the summary from partition sizes. The ratio is zero when
    /// nothing was checked.
    pub fn from_counts(matched: usize, unmatched: usize) -> Self {
        let total = matched + unmatched;
        let ratio = if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        };
        Self {
            total,
            matched,
            unmatched,
            ratio,
        }
    }

    /// Match ratio as a percentage with one decimal place, e.g. `66.7%`.
    pub fn ratio_percent(&self) -> String {
        format!("{:.1}%", self.ratio * 100.0)
    }
}

#[derive(Serialize)]
struct SummaryJson {
    total: usize,
    matched: usize,
    unmatched: usize,
    ratio: f64,
    ratio_percent: String,
}

impl From<Summary> for SummaryJson {
    fn from(summary: Summary) -> Self {
        Self {
            total: summary.total,
            matched: summary.matched,
            unmatched: summary.unmatched,
            ratio: summary.ratio,
            ratio_percent: summary.ratio_percent(),
        }
    }
}

/// Result of reconciling one candidate table against one master table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedRow>,
    pub unmatched: Vec<UnmatchedRow>,
    pub summary: Summary,
}

/// Joins `candidates` against `master` on the normalized name key.
///
/// Fails with [`ToolError::ColumnOutOfRange`] when a configured column lies
/// beyond the width of a non-empty table. Candidate order is preserved, and
/// a candidate's partners are listed in master row order.
pub fn match_tables(
    master: &Table,
    candidates: &Table,
    columns: &MatchColumns,
    options: &MatchOptions,
) -> Result<MatchOutcome> {
    ensure_in_range(master, columns.master_name, "master")?;
    ensure_in_range(master, columns.master_surname, "master")?;
    ensure_in_range(candidates, columns.candidate_name, "candidate")?;

    let master_records: Vec<MasterRecord> = master
        .rows
        .iter()
        .map(|row| MasterRecord::from_row(row, columns.master_name, columns.master_surname))
        .collect();
    let index = index_by_key(&master_records, options);
    debug!(
        master_records = master_records.len(),
        distinct_keys = index.len(),
        "indexed master records"
    );

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for row in &candidates.rows {
        let candidate = CandidateRecord::from_row(row, columns.candidate_name);
        match index.get(candidate.normalized_key.as_str()) {
            Some(partners) => {
                for &position in partners {
                    matched.push(MatchedRow {
                        candidate_display: candidate.original_display.clone(),
                        candidate_key: candidate.normalized_key.clone(),
                        master_display: master_records[position].original_display.clone(),
                    });
                }
            }
            None => {
                trace!(
                    row = candidate.row_index,
                    key = %candidate.normalized_key,
                    "candidate has no master partner"
                );
                unmatched.push(UnmatchedRow {
                    candidate_display: candidate.original_display,
                    candidate_key: candidate.normalized_key,
                });
            }
        }
    }

    let summary = Summary::from_counts(matched.len(), unmatched.len());
    debug!(
        matched = summary.matched,
        unmatched = summary.unmatched,
        "joined candidate records"
    );

    Ok(MatchOutcome {
        matched,
        unmatched,
        summary,
    })
}

fn ensure_in_range(table: &Table, column: ColumnRef, name: &'static str) -> Result<()> {
    let width = table.width();
    if table.is_empty() || column.index() < width {
        return Ok(());
    }
    Err(ToolError::ColumnOutOfRange {
        column: column.label(),
        width,
        table: name,
    })
}

fn index_by_key<'a>(
    records: &'a [MasterRecord],
    options: &MatchOptions,
) -> HashMap<&'a str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        if record.normalized_key.is_empty() && !options.join_empty_keys {
            trace!(row = record.row_index, "master row has an empty key");
            continue;
        }
        index
            .entry(record.normalized_key.as_str())
            .or_default()
            .push(position);
    }
    index
}
