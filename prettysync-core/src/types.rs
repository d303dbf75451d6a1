//! Domain types shared by every prettysync crate.
//!
//! Object and include types use the remote repository's `MAJOR/MINOR` type
//! codes (`PROG/P`, `CLAS/OC`, `DEVC/K`, ...). Only the major part is
//! validated locally; the minor part is passed through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Object types
// ---------------------------------------------------------------------------

/// Major object types accepted in a manifest.
pub const SUPPORTED_MAJOR_TYPES: &[&str] = &["PROG", "CLAS", "INTF", "FUGR", "DEVC"];

/// Package (container) type code.
pub const PACKAGE_TYPE: &str = "DEVC/K";

/// Include type that needs its main program as activation context.
pub const PROGRAM_INCLUDE_TYPE: &str = "PROG/I";

/// Major part of a type code: `PROG/P` -> `PROG`, `PROG` -> `PROG`.
pub fn major_type(object_type: &str) -> &str {
    object_type.split('/').next().unwrap_or(object_type)
}

/// `true` when the major part of `object_type` is one of
/// [`SUPPORTED_MAJOR_TYPES`]. Case-insensitive.
pub fn is_supported_type(object_type: &str) -> bool {
    let major = major_type(object_type).to_ascii_uppercase();
    SUPPORTED_MAJOR_TYPES.contains(&major.as_str())
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A top-level repository object to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn is_package(&self) -> bool {
        self.object_type.eq_ignore_ascii_case(PACKAGE_TYPE)
    }
}

impl fmt::Display for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.object_type, self.name)
    }
}

/// A leaf unit with readable/writable source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    #[serde(rename = "type")]
    pub include_type: String,
    /// Name of the owning object; activation refers to it.
    pub name: String,
    /// Which part of a multi-include object this is, e.g. a class's
    /// `definitions`. `None` for single-source objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
    /// Where the source text is read from and written to.
    pub source_url: String,
    /// Object metadata URL; used for locking, activation and main program
    /// lookup.
    pub meta_url: String,
}

impl Include {
    /// Program includes cannot be activated on their own; activation needs
    /// the including main program as context.
    pub fn needs_main_program(&self) -> bool {
        self.include_type.eq_ignore_ascii_case(PROGRAM_INCLUDE_TYPE)
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.include_type, self.name)?;
        if let Some(part) = &self.part {
            write!(f, " {part}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Locking
// ---------------------------------------------------------------------------

/// Exclusive write access to one include, as granted by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lock {
    pub handle: Option<String>,
    /// Local-only object: no tracking id may be used.
    pub is_local: bool,
    /// Tracking id the object is already locked under, if any.
    pub tracking_id: Option<String>,
}

impl Lock {
    /// The lock handle, ignoring empty handles.
    pub fn usable_handle(&self) -> Option<&str> {
        self.handle.as_deref().filter(|h| !h.is_empty())
    }
}

/// Remote session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionType {
    Stateful,
    #[default]
    Stateless,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Stateful => write!(f, "stateful"),
            SessionType::Stateless => write!(f, "stateless"),
        }
    }
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

/// A diagnostic returned by an activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationMessage {
    /// Severity code: `E`, `W`, `I`, `A`, `X`.
    pub severity: String,
    pub text: String,
}

impl ActivationMessage {
    pub fn is_error(&self) -> bool {
        matches!(self.severity.as_str(), "E" | "A" | "X")
    }
}

/// An object the remote left inactive after an activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactiveObject {
    pub object_type: String,
    pub name: String,
    pub url: String,
    pub parent_url: Option<String>,
}

/// Outcome of one activation request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationResult {
    pub success: bool,
    pub messages: Vec<ActivationMessage>,
    pub inactive: Vec<InactiveObject>,
}

impl ActivationResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Text of the first diagnostic, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.messages.first().map(|m| m.text.as_str())
    }
}

/// A main program that includes a given include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainProgram {
    pub uri: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Run options
// ---------------------------------------------------------------------------

/// Caller-supplied run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Lock, validate and unlock, but never write or activate.
    pub dry_run: bool,
    /// Tracking id to validate (and write) each include under.
    pub tracking_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
