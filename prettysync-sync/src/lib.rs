//! # prettysync-sync
//!
//! Lock-guarded write-back of reformatted source into the remote repository.
//!
//! Build a [`SourceSync`] from a transport, an expander and a formatter, then
//! call [`SourceSync::process_objects`] with the objects from
//! [`listing::list`].

pub mod error;
pub mod guard;
pub mod listing;
pub mod pipeline;
pub mod status;
pub mod writer;

pub use error::SyncError;
pub use guard::LockOutcome;
pub use pipeline::SourceSync;
pub use status::{IncludeOutcome, NoopObserver, SyncObserver, SyncStats};
