//! Error types for prettysync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a [`Transport`](crate::Transport) or any collaborator
/// that talks to the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote refused the request and described why.
    ///
    /// `category` is the remote's exception type (e.g.
    /// `ExceptionResourceNoAccess`), `message` its localized text.
    #[error("{category}: {message}")]
    Remote { category: String, message: String },

    /// Non-success HTTP status without a structured exception body.
    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    /// The request never reached the remote.
    #[error("connection error: {0}")]
    Connection(String),

    /// The remote answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Protocol(String),
}

/// Errors raised while reading a static object manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: unsupported object type '{object_type}'")]
    UnsupportedType {
        path: PathBuf,
        line: usize,
        object_type: String,
    },

    #[error("{path}:{line}: missing url")]
    MissingUrl { path: PathBuf, line: usize },
}

/// Errors raised while loading connection profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load: includes file path.
    #[error("failed to parse connection profiles at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.prettysync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("connection profile '{0}' not found")]
    UnknownConnection(String),
}
