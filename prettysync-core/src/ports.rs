//! Port traits abstracting the remote repository away from the sync core.
//!
//! Every method takes `&self`; implementations that carry session state
//! (CSRF tokens, cookies, session mode) keep it behind interior mutability.

use crate::error::TransportError;
use crate::types::{
    ActivationResult, InactiveObject, Include, Lock, MainProgram, ObjectDescriptor, SessionType,
};

/// Low-level remote calls used by the sync pipeline.
pub trait Transport {
    /// Switch the session between stateful and stateless mode.
    fn set_session_type(&self, session: SessionType) -> Result<(), TransportError>;

    /// Tear the session down (log off, forget cookies and tokens).
    fn drop_session(&self) -> Result<(), TransportError>;

    fn lock(&self, url: &str) -> Result<Lock, TransportError>;

    fn unlock(&self, url: &str, handle: &str) -> Result<(), TransportError>;

    fn get_object_source(&self, url: &str) -> Result<String, TransportError>;

    fn set_object_source(
        &self,
        url: &str,
        source: &str,
        handle: &str,
        tracking_id: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Activate a single object, optionally in the context of a main program.
    fn activate(
        &self,
        name: &str,
        url: &str,
        main_program: Option<&str>,
    ) -> Result<ActivationResult, TransportError>;

    /// Activate a set of objects a previous activation left inactive.
    fn activate_inactive(
        &self,
        objects: &[InactiveObject],
    ) -> Result<ActivationResult, TransportError>;

    /// Main programs including the object at `meta_url`. Runs outside the
    /// stateful session.
    fn main_programs(&self, meta_url: &str) -> Result<Vec<MainProgram>, TransportError>;

    /// Remote pretty printer. Runs outside the stateful session.
    fn pretty_print(&self, source: &str) -> Result<String, TransportError>;
}

/// Expands a top-level object into its includes, order preserved.
pub trait Expander {
    fn expand(&self, object: &ObjectDescriptor) -> Result<Vec<Include>, TransportError>;
}

/// Live object discovery.
pub trait Discovery {
    /// List objects of `object_type` named `name`. Containers are expanded
    /// into their contents; `recursive` also expands nested containers.
    /// `progress` receives the name of each container as it is read.
    fn list(
        &self,
        object_type: &str,
        name: &str,
        recursive: bool,
        progress: &mut dyn FnMut(&str),
    ) -> Result<Vec<ObjectDescriptor>, TransportError>;
}
