//! Durable per-member attendance log.
//!
//! The log is read once, extended in memory and written back whole. Writes
//! go through a temp file in the same directory followed by a rename, so a
//! crash never leaves a half-written log behind.

mod merge;

pub use merge::{MergePolicy, MergeReport, merge};

use crate::errors::{AppError, AppResult};
use crate::models::WorkoutLog;
use crate::utils::date::iso_week;
use crate::utils::text::decode_html_text;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Most recent event already in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighWaterMark {
    pub date: NaiveDate,
    pub week: u32,
    /// `None` when the log is empty and the epoch default applies.
    pub event_time: Option<NaiveDateTime>,
}

impl HighWaterMark {
    pub fn is_epoch_default(&self) -> bool {
        self.event_time.is_none()
    }
}

/// Latest `event_time` in `log`, or `epoch` for an empty log.
pub fn high_water_mark(log: &WorkoutLog, epoch: NaiveDate) -> HighWaterMark {
    match log.latest_event_time() {
        Some(latest) => HighWaterMark {
            date: latest.date(),
            week: iso_week(latest.date()),
            event_time: Some(latest),
        },
        None => HighWaterMark {
            date: epoch,
            week: iso_week(epoch),
            event_time: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct MergeStore {
    path: PathBuf,
    attempts: usize,
    retry_delay: Duration,
}

impl MergeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            attempts: 3,
            retry_delay: Duration::from_millis(200),
        }
    }

    /// How many times `persist` tries before giving up.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the log; a missing file is an empty log.
    pub fn load(&self) -> AppResult<WorkoutLog> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no workout log yet");
            return Ok(WorkoutLog::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(WorkoutLog::new());
        }
        let raw: WorkoutLog = serde_json::from_str(&content).map_err(|e| {
            AppError::Persistence(format!("{} is not a valid workout log: {e}", self.path.display()))
        })?;

        // older logs hold names as scraped, entities and all
        let members = raw.member_count();
        let log = raw.renamed(decode_html_text);
        if log.member_count() != members {
            info!(
                before = members,
                after = log.member_count(),
                "merged members whose names differ only in HTML encoding"
            );
        }
        Ok(log)
    }

    /// Replace the stored log with `log`.
    ///
    /// Retries failed writes. When every attempt fails the log is dumped
    /// to a rescue file beside the target and the error names it.
    pub fn persist(&self, log: &WorkoutLog) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(log)?;

        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match write_atomic(&self.path, &bytes) {
                Ok(()) => {
                    info!(
                        path = %self.path.display(),
                        members = log.member_count(),
                        records = log.record_count(),
                        "workout log persisted"
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, path = %self.path.display(), error = %e, "persist failed");
                    last_error = Some(e);
                    if attempt < self.attempts {
                        thread::sleep(self.retry_delay * attempt as u32);
                    }
                }
            }
        }

        let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
        let rescue = self.rescue_path();
        match fs::write(&rescue, &bytes) {
            Ok(()) => Err(AppError::Persistence(format!(
                "{} could not be written ({cause}); crawl results saved to {}",
                self.path.display(),
                rescue.display()
            ))),
            Err(e) => Err(AppError::Persistence(format!(
                "{} could not be written ({cause}) and the rescue copy {} failed too ({e})",
                self.path.display(),
                rescue.display()
            ))),
        }
    }

    /// [`persist`](Self::persist) on the blocking pool, so retry sleeps do
    /// not stall the async runtime.
    pub async fn persist_in_background(&self, log: WorkoutLog) -> AppResult<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.persist(&log))
            .await
            .map_err(|e| AppError::Other(format!("persist task failed: {e}")))?
    }

    fn rescue_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "workout_log".to_string());
        let stamp = Local::now().format("%Y%m%dT%H%M%S");
        let name = format!("{stem}.rescue-{stamp}.json");
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && dir.is_dir() => dir.join(name),
            _ => std::env::temp_dir().join(name),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
