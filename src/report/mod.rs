use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::matcher::MatchOutcome;
use crate::model::{CellValue, SheetTable, WorkbookData};

/// File name of the report written next to the master workbook.
pub const REPORT_FILE_NAME: &str = "match_report.xlsx";
/// Sheet holding the summary counts.
pub const SUMMARY_SHEET: &str = "Summary";
/// Sheet holding one row per joined (candidate, master) pair.
pub const MATCHED_SHEET: &str = "Matched";
/// Sheet holding candidates without a master partner.
pub const UNMATCHED_SHEET: &str = "Unmatched";

/// Excel rejects sheet names longer than this.
const MAX_SHEET_NAME_LEN: usize = 31;

const ENTERED_NAME: &str = "Entered Name";
const NORMALIZED: &str = "Normalized";
const MATCHED_MASTER_NAME: &str = "Matched Master Name";

/// Location of the report for a given master workbook.
pub fn report_path(master: &Path) -> PathBuf {
    master
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join(REPORT_FILE_NAME)
}

/// Lays the outcome out as the `Summary`, `Matched` and `Unmatched` sheets.
pub fn build_report(outcome: &MatchOutcome) -> WorkbookData {
    let summary = &outcome.summary;
    let summary_table = SheetTable {
        sheet_name: SUMMARY_SHEET.to_string(),
        columns: vec!["Metric".to_string(), "Value".to_string()],
        rows: vec![
            vec!["Total Checked Records".into(), summary.total.into()],
            vec!["Matched Records".into(), summary.matched.into()],
            vec!["Unmatched Records".into(), summary.unmatched.into()],
            vec!["Match Ratio".into(), summary.ratio_percent().into()],
        ],
    };

    let matched_table = SheetTable {
        sheet_name: MATCHED_SHEET.to_string(),
        columns: vec![
            ENTERED_NAME.to_string(),
            NORMALIZED.to_string(),
            MATCHED_MASTER_NAME.to_string(),
        ],
        rows: outcome
            .matched
            .iter()
            .map(|row| {
                vec![
                    CellValue::from(row.candidate_display.as_str()),
                    CellValue::from(row.candidate_key.as_str()),
                    CellValue::from(row.master_display.as_str()),
                ]
            })
            .collect(),
    };

    let unmatched_table = SheetTable {
        sheet_name: UNMATCHED_SHEET.to_string(),
        columns: vec![ENTERED_NAME.to_string(), NORMALIZED.to_string()],
        rows: outcome
            .unmatched
            .iter()
            .map(|row| {
                vec![
                    CellValue::from(row.candidate_display.as_str()),
                    CellValue::from(row.candidate_key.as_str()),
                ]
            })
            .collect(),
    };

    WorkbookData {
        tables: vec![summary_table, matched_table, unmatched_table],
    }
}

/// Renames the sheets of `report` so none collides with `existing`, for
/// appending to a workbook that already holds those sheets.
pub fn rename_for_append<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    report: WorkbookData,
) -> WorkbookData {
    let mut sheet_names = SheetNameRegistry::default();
    for name in existing {
        sheet_names.claim(name);
    }

    let tables = report
        .tables
        .into_iter()
        .map(|mut table| {
            table.sheet_name = sheet_names.assign(&table.sheet_name);
            table
        })
        .collect();

    WorkbookData { tables }
}

/// Tracks sheet names in use. Names compare case-insensitively, as Excel
/// does.
#[derive(Debug, Default)]
pub struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    /// Marks `name` as taken.
    pub fn claim(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    /// Claims and returns `base` if unused, otherwise `base` followed by the
    /// smallest positive integer that makes it unused.
    pub fn assign(&mut self, base: &str) -> String {
        let base = truncate_chars(base, MAX_SHEET_NAME_LEN);
        if !self.is_taken(&base) {
            self.claim(&base);
            return base;
        }

        let mut counter = 1usize;
        loop {
            let suffix = counter.to_string();
            let prefix = truncate_chars(&base, MAX_SHEET_NAME_LEN - suffix.len());
            let candidate = format!("{prefix}{suffix}");
            if !self.is_taken(&candidate) {
                self.claim(&candidate);
                return candidate;
            }
            counter += 1;
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
