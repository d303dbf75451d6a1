//! prettysync core library: domain types, collaborator ports, manifest
//! loading, connection profiles, errors.
//!
//! - [`types`]: object descriptors, includes, locks, activation results
//! - [`ports`]: [`Transport`], [`Expander`], [`Discovery`]
//! - [`manifest`]: static object lists
//! - [`config`]: connection profiles under `~/.prettysync/`
//! - [`error`]: [`TransportError`], [`ManifestError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod manifest;
pub mod ports;
pub mod types;

pub use error::{ConfigError, ManifestError, TransportError};
pub use ports::{Discovery, Expander, Transport};
pub use types::{
    ActivationMessage, ActivationResult, InactiveObject, Include, Lock, MainProgram,
    ObjectDescriptor, SessionType, SyncOptions,
};
