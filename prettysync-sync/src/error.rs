//! Error types for prettysync-sync.

use thiserror::Error;

use prettysync_core::{ManifestError, TransportError};
use prettysync_format::FormatError;

/// All errors that can end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Conflicting or missing list arguments.
    #[error("usage error: {0}")]
    Usage(String),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Any remote failure, carried unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The remote granted a lock without a usable handle.
    #[error("failed to lock {unit}")]
    LockFailed { unit: String },

    #[error("{unit} is local, can't use tracking id {tracking_id}")]
    LocalWithTrackingId { unit: String, tracking_id: String },

    #[error("{unit} requires a tracking id{}", locked_suffix(.locked_under))]
    TrackingIdRequired {
        unit: String,
        locked_under: Option<String>,
    },

    #[error("{unit} locked under tracking id {locked_under}, can't use {supplied}")]
    TrackingIdMismatch {
        unit: String,
        locked_under: String,
        supplied: String,
    },

    /// Activation reported errors; `message` is the remote's first diagnostic.
    #[error("{unit}: {message}")]
    ActivationFailed { unit: String, message: String },
}

fn locked_suffix(locked_under: &Option<String>) -> String {
    locked_under
        .as_ref()
        .map(|t| format!(" (locked under {t})"))
        .unwrap_or_default()
}
