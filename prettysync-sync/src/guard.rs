//! Lock acquisition and tracking id validation.
//!
//! A refused lock is only ever a skip when the remote says "no access" and
//! does not say the object is locked by someone else. That is how derived
//! (generated) includes show up; every other refusal, including real
//! contention, ends the run.

use prettysync_core::{Lock, Transport, TransportError};

use crate::error::SyncError;

/// Remote exception category for "no access to resource".
pub const NO_ACCESS_CATEGORY: &str = "ExceptionResourceNoAccess";

/// Result of a lock attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Locked(Lock),
    /// The unit cannot be locked at all, e.g. a generated include.
    NotLockable,
}

/// `true` when a lock refusal means "this unit can never be locked".
pub fn is_not_lockable(err: &TransportError) -> bool {
    match err {
        TransportError::Remote { category, message } => {
            category == NO_ACCESS_CATEGORY && !message.to_ascii_lowercase().contains("locked")
        }
        _ => false,
    }
}

/// Try to lock the unit at `url`.
pub fn try_lock(transport: &dyn Transport, url: &str) -> Result<LockOutcome, SyncError> {
    match transport.lock(url) {
        Ok(lock) => Ok(LockOutcome::Locked(lock)),
        Err(err) if is_not_lockable(&err) => {
            tracing::debug!("not lockable: {url}: {err}");
            Ok(LockOutcome::NotLockable)
        }
        Err(err) => Err(err.into()),
    }
}

/// Check that `supplied` is compatible with the tracking assignment the lock
/// reports for `unit`.
pub fn validate_transport(
    lock: &Lock,
    unit: &str,
    supplied: Option<&str>,
) -> Result<(), SyncError> {
    match (lock.is_local, supplied, lock.tracking_id.as_deref()) {
        (true, Some(id), _) => Err(SyncError::LocalWithTrackingId {
            unit: unit.to_string(),
            tracking_id: id.to_string(),
        }),
        (false, None, locked_under) => Err(SyncError::TrackingIdRequired {
            unit: unit.to_string(),
            locked_under: locked_under.map(str::to_string),
        }),
        (false, Some(id), Some(locked_under)) if id != locked_under => {
            Err(SyncError::TrackingIdMismatch {
                unit: unit.to_string(),
                locked_under: locked_under.to_string(),
                supplied: id.to_string(),
            })
        }
        _ => Ok(()),
    }
}
