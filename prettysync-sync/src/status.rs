//! Run accounting and progress reporting.
//!
//! [`RunStatus`] lives for exactly one `process_objects` call and is owned by
//! it. Callers that want live progress implement [`SyncObserver`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use prettysync_core::{Include, ObjectDescriptor};

use crate::error::SyncError;

/// Outcome of one include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeOutcome {
    /// Formatted text equals the remote source; nothing was locked.
    Unchanged,
    /// The include cannot be locked (derived artifact); skipped.
    Generated,
    /// Written and activated.
    Written,
    /// `--dry-run`: locked, validated and unlocked, but not written.
    WouldWrite,
}

impl IncludeOutcome {
    pub fn label(self) -> &'static str {
        match self {
            IncludeOutcome::Unchanged => "unchanged",
            IncludeOutcome::Generated => "generated, skipped",
            IncludeOutcome::Written => "written",
            IncludeOutcome::WouldWrite => "would write",
        }
    }
}

/// Running counters of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub processed_objects: usize,
    pub processed_includes: usize,
    /// Includes that reached the write step (dry-run included).
    pub written_includes: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl SyncStats {
    pub(crate) fn start() -> Self {
        Self {
            processed_objects: 0,
            processed_includes: 0,
            written_includes: 0,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.duration_ms = (Utc::now() - self.started_at).num_milliseconds();
    }

    /// One-line summary, as printed at the end of every run.
    pub fn summary(&self) -> String {
        format!(
            "processed {} object(s), {} include(s), wrote {} include(s) in {} ms",
            self.processed_objects,
            self.processed_includes,
            self.written_includes,
            self.duration_ms
        )
    }
}

/// In-flight state of one run.
///
/// `current_include` is only set while that include's pipeline runs; it stays
/// set when the pipeline fails so the failure can name it.
#[derive(Debug)]
pub(crate) struct RunStatus {
    pub current_object: Option<ObjectDescriptor>,
    pub current_include: Option<Include>,
    pub stats: SyncStats,
}

impl RunStatus {
    pub fn new() -> Self {
        Self {
            current_object: None,
            current_include: None,
            stats: SyncStats::start(),
        }
    }
}

/// Live progress callbacks. Every method defaults to a no-op.
pub trait SyncObserver {
    fn on_object(&self, _object: &ObjectDescriptor) {}

    fn on_include(&self, _include: &Include, _outcome: IncludeOutcome) {}

    /// A fatal error is about to end the run.
    fn on_failure(
        &self,
        _object: Option<&ObjectDescriptor>,
        _include: Option<&Include>,
        _error: &SyncError,
    ) {
    }

    /// Always called once at the end of a run, successful or not.
    fn on_summary(&self, _stats: &SyncStats) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}
