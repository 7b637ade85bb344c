use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while a
/// reconciliation run loads, matches, or persists data.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Raised when a column label is empty or contains anything besides `A`-`Z`.
    #[error("invalid column label '{0}' (expected letters such as A, B, AA)")]
    InvalidColumnLabel(String),

    /// Raised when a negative index is converted into a column label.
    #[error("invalid column index {0}")]
    InvalidColumnIndex(i64),

    /// Raised when an input spreadsheet cannot be opened or parsed.
    #[error("failed to read {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    /// Raised when a configured column lies beyond the width of its table.
    #[error("column {column} is out of range for the {table} table ({width} columns)")]
    ColumnOutOfRange {
        column: String,
        width: usize,
        table: &'static str,
    },

    /// Raised when the report workbook cannot be persisted.
    #[error("failed to write report {path}: {reason}")]
    ReportWrite { path: PathBuf, reason: String },

    /// Raised when another run currently holds the report lock.
    #[error("report {0} is being written by another run")]
    ReportLocked(PathBuf),

    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
