//! # prettysync-adt
//!
//! Blocking HTTP implementation of the prettysync ports against an ADT-style
//! REST repository.
//!
//! - [`AdtClient`] implements [`Transport`](prettysync_core::Transport): sessions,
//!   locks, source, activation, pretty printer
//! - [`AdtExpander`]: [`Expander`](prettysync_core::Expander)
//! - [`AdtDiscovery`]: [`Discovery`](prettysync_core::Discovery)

pub mod client;
pub mod discovery;
pub mod expand;
mod xml;

pub use client::{AdtClient, AdtConfig};
pub use discovery::AdtDiscovery;
pub use expand::AdtExpander;
