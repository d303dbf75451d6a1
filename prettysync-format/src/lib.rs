//! # prettysync-format
//!
//! Formatter strategies that turn remote source text into its reformatted
//! replacement.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use prettysync_core::{Include, Transport};
//! use prettysync_format::select;
//!
//! fn reformat(transport: &dyn Transport, include: &Include, source: &str) {
//!     if let Ok(formatter) = select(transport, None) {
//!         if let Ok(text) = formatter.format(include, source) {
//!             println!("{} bytes", text.len());
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::LinterConfig;
pub use engine::{select, Formatter, LinterFormatter, TransportFormatter};
pub use error::FormatError;
