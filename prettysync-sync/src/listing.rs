//! Object list loading: a static manifest or a live discovery query, never
//! both.

use std::path::PathBuf;

use prettysync_core::{manifest, Discovery, ObjectDescriptor};

use crate::error::SyncError;

/// Which objects to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub object_type: Option<String>,
    pub name: Option<String>,
    /// Manifest file; excludes `object_type` and `name`.
    pub file: Option<PathBuf>,
    /// Expand nested containers in query mode.
    pub recursive: bool,
}

/// Resolve `request` into the ordered list of objects to process.
///
/// Usage errors are raised before the discovery service is touched.
pub fn list(
    discovery: &dyn Discovery,
    request: &ListRequest,
    progress: &mut dyn FnMut(&str),
) -> Result<Vec<ObjectDescriptor>, SyncError> {
    match (&request.file, &request.object_type, &request.name) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(SyncError::Usage(
            "a manifest file cannot be combined with a type or name filter".to_string(),
        )),
        (Some(file), None, None) => Ok(manifest::load(file)?),
        (None, Some(object_type), Some(name)) => {
            Ok(discovery.list(object_type, name, request.recursive, progress)?)
        }
        (None, _, _) => Err(SyncError::Usage(
            "provide a manifest file, or both an object type and a name".to_string(),
        )),
    }
}
