//! Static object manifests.
//!
//! One object per line, whitespace separated:
//!
//! ```text
//! type     name      url
//! PROG/P   ZREPORT   /sap/bc/adt/programs/programs/zreport
//! CLAS/OC  ZCL_FOO   /sap/bc/adt/oo/classes/zcl_foo
//! ```
//!
//! The first line is a header only if it contains no `/`; every data row
//! carries a url, so a first line with a `/` is treated as data.

use std::path::Path;

use crate::error::ManifestError;
use crate::types::{is_supported_type, ObjectDescriptor};

/// Read and parse the manifest at `path`.
pub fn load(path: &Path) -> Result<Vec<ObjectDescriptor>, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &contents)
}

/// Parse manifest `contents`. `path` is only used for error messages.
pub fn parse(path: &Path, contents: &str) -> Result<Vec<ObjectDescriptor>, ManifestError> {
    let mut objects = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if idx == 0 && !line.contains('/') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let Some(object_type) = fields.next() else {
            continue;
        };
        let line_no = idx + 1;
        if !is_supported_type(object_type) {
            return Err(ManifestError::UnsupportedType {
                path: path.to_path_buf(),
                line: line_no,
                object_type: object_type.to_string(),
            });
        }
        let (Some(name), Some(url)) = (fields.next(), fields.next()) else {
            return Err(ManifestError::MissingUrl {
                path: path.to_path_buf(),
                line: line_no,
            });
        };
        objects.push(ObjectDescriptor::new(object_type, name).with_url(url));
    }
    Ok(objects)
}
