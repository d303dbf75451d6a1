//! Error types for prettysync-format.

use std::path::PathBuf;

use thiserror::Error;

use prettysync_core::TransportError;

/// All errors that can arise while formatting source text.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The remote pretty printer failed.
    #[error("remote pretty printer failed: {0}")]
    Transport(#[from] TransportError),

    /// Linter config could not be read.
    #[error("linter config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Linter config is not valid YAML/JSON.
    #[error("failed to parse linter config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The linter process could not be started or talked to.
    #[error("failed to run linter '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The linter exited unsuccessfully.
    #[error("linter '{command}' failed on {include} ({status}): {stderr}")]
    Linter {
        command: String,
        include: String,
        status: String,
        stderr: String,
    },

    #[error("linter '{command}' produced non UTF-8 output for {include}")]
    Encoding { command: String, include: String },
}
