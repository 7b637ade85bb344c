use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Result, ToolError};
use crate::io::{excel_read, excel_write};
use crate::matcher::{self, MatchColumns, MatchOptions, Summary};
use crate::model::WorkbookData;
use crate::report;

/// Inputs of a single reconciliation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Authoritative workbook holding name and surname columns.
    pub master: PathBuf,
    /// Workbook holding the names to verify.
    pub candidates: PathBuf,
    pub columns: MatchColumns,
    pub options: MatchOptions,
    /// Overrides the default report location next to the master workbook.
    pub output: Option<PathBuf>,
}

impl RunConfig {
    /// Creates a run with default columns and options.
    pub fn new(master: impl Into<PathBuf>, candidates: impl Into<PathBuf>) -> Self {
        Self {
            master: master.into(),
            candidates: candidates.into(),
            columns: MatchColumns::default(),
            options: MatchOptions::default(),
            output: None,
        }
    }

    /// Path the report will be written to.
    pub fn report_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| report::report_path(&self.master))
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub report_path: PathBuf,
    pub columns: MatchColumns,
    pub summary: Summary,
    /// Whether the report sheets were appended to an existing workbook.
    pub appended: bool,
}

/// Loads both workbooks, reconciles them and persists the report.
///
/// Nothing is written unless every step before the final save succeeds.
/// This call blocks; callers with an interactive surface should run it on a
/// worker thread.
#[instrument(
    level = "info",
    skip_all,
    fields(master = %config.master.display(), candidates = %config.candidates.display())
)]
pub fn run_match(config: &RunConfig) -> Result<RunReport> {
    for input in [&config.master, &config.candidates] {
        if !input.exists() {
            return Err(ToolError::SourceRead {
                path: input.clone(),
                reason: "file not found".to_string(),
            });
        }
    }

    let master = excel_read::read_table(&config.master)?;
    info!(
        rows = master.len(),
        name_column = %config.columns.master_name,
        surname_column = %config.columns.master_surname,
        "loaded master list"
    );

    let candidates = excel_read::read_table(&config.candidates)?;
    info!(
        rows = candidates.len(),
        name_column = %config.columns.candidate_name,
        "loaded candidate list"
    );

    let outcome = matcher::match_tables(&master, &candidates, &config.columns, &config.options)?;
    let workbook = report::build_report(&outcome);
    debug!(sheet_count = workbook.tables.len(), "report constructed");

    let report_path = config.report_path();
    let appended = persist_report(&report_path, workbook)?;
    info!(
        report = %report_path.display(),
        matched = outcome.summary.matched,
        unmatched = outcome.summary.unmatched,
        ratio = %outcome.summary.ratio_percent(),
        appended,
        "report saved"
    );

    Ok(RunReport {
        report_path,
        columns: config.columns,
        summary: outcome.summary,
        appended,
    })
}

/// Writes `workbook` to `path`, appending its sheets when a report already
/// exists there. Returns whether an append took place.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn persist_report(path: &Path, workbook: WorkbookData) -> Result<bool> {
    let _lock = ReportLock::acquire(path)?;

    if path.exists() {
        let sheets = excel_write::append_workbook(path, &workbook)?;
        debug!(?sheets, "report sheets appended");
        Ok(true)
    } else {
        excel_write::write_workbook(path, &workbook)?;
        Ok(false)
    }
}

/// Locks older than this are taken over even if their owner looks alive.
const STALE_LOCK_AGE: Duration = Duration::from_secs(60 * 60);

/// Contents of a report lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockRecord {
    pid: u32,
    created_unix: u64,
}

/// Advisory lock serializing the check-then-write of one report path.
///
/// The lock file is removed when the guard is dropped. A lock left behind by
/// a run that died (unreadable record, exited owner, or older than
/// [`STALE_LOCK_AGE`]) is replaced instead of blocking later runs.
struct ReportLock {
    path: PathBuf,
}

impl ReportLock {
    fn acquire(report: &Path) -> Result<Self> {
        let mut lock_name = report.as_os_str().to_owned();
        lock_name.push(".lock");
        let path = PathBuf::from(lock_name);

        if let Some(lock) = Self::try_create(&path, report)? {
            return Ok(lock);
        }
        if !lock_is_stale(&path) {
            return Err(ToolError::ReportLocked(report.to_path_buf()));
        }

        warn!(lock = %path.display(), "replacing stale report lock");
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(lock_error(report, err)),
        }
        Self::try_create(&path, report)?
            .ok_or_else(|| ToolError::ReportLocked(report.to_path_buf()))
    }

    /// Publishes a complete lock record at `path`, or returns `None` when a
    /// lock is already there. The record is written to a private file and
    /// hard-linked into place, so a lock file is never observed half written.
    fn try_create(path: &Path, report: &Path) -> Result<Option<Self>> {
        let record = LockRecord {
            pid: std::process::id(),
            created_unix: unix_now(),
        };
        let staging = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&staging, serde_json::to_vec(&record)?).map_err(|err| lock_error(report, err))?;

        let linked = fs::hard_link(&staging, path);
        let _ = fs::remove_file(&staging);
        match linked {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
            })),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(lock_error(report, err)),
        }
    }
}

impl Drop for ReportLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), %err, "failed to remove report lock");
        }
    }
}

fn lock_is_stale(path: &Path) -> bool {
    let record = fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<LockRecord>(&bytes).ok());
    match record {
        None => true,
        Some(record) => {
            let age = unix_now().saturating_sub(record.created_unix);
            age > STALE_LOCK_AGE.as_secs() || !process_alive(record.pid)
        }
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// Elsewhere only the age limit marks a lock stale.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn lock_error(report: &Path, err: std::io::Error) -> ToolError {
    ToolError::ReportWrite {
        path: report.to_path_buf(),
        reason: format!("could not create lock file: {err}"),
    }
}
