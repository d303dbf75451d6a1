//! Expansion of repository objects into their source includes.
//!
//! | Object type        | Includes                                         |
//! |--------------------|--------------------------------------------------|
//! | `PROG/P`, `PROG/I` | the program's main source                        |
//! | `INTF/OI`          | the interface's main source                      |
//! | `CLAS/OC`          | every include listed in the class metadata (`CLAS/I`) |
//! | `FUGR/F`           | every function module and include of the group   |
//! | `FUGR/FF`, `FUGR/I`| the function module's / include's main source    |
//! | `DEVC/K`           | the includes of each directly contained object   |
//!
//! Anything else has no source of its own and expands to nothing.

use prettysync_core::types::{is_supported_type, major_type};
use prettysync_core::{Expander, Include, ObjectDescriptor, TransportError};

use crate::client::AdtClient;

/// Type of the includes a class expands to.
const CLASS_INCLUDE_TYPE: &str = "CLAS/I";

pub struct AdtExpander<'a> {
    client: &'a AdtClient,
}

impl<'a> AdtExpander<'a> {
    pub fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    /// Find the object's url by exact name when the descriptor has none.
    fn resolve_url(&self, object: &ObjectDescriptor) -> Result<String, TransportError> {
        self.client
            .search_objects(&object.name, Some(&object.object_type))?
            .into_iter()
            .find(|o| o.name.eq_ignore_ascii_case(&object.name))
            .and_then(|o| o.url)
            .ok_or_else(|| TransportError::Remote {
                category: "ExceptionResourceNotFound".to_string(),
                message: format!("{object} not found"),
            })
    }

    fn expand_object(
        &self,
        object_type: &str,
        name: &str,
        url: &str,
    ) -> Result<Vec<Include>, TransportError> {
        let object_type = normalize_type(object_type);
        match object_type.as_str() {
            "CLAS/OC" => self.class(name, url),
            "FUGR/F" => self.function_group(name),
            "DEVC/K" => self.package(name),
            "PROG/P" | "PROG/I" | "INTF/OI" | "FUGR/FF" | "FUGR/I" => {
                Ok(vec![main_include(&object_type, name, url)])
            }
            _ => {
                tracing::debug!("{object_type} {name} has no source, skipping");
                Ok(Vec::new())
            }
        }
    }

    fn class(&self, name: &str, url: &str) -> Result<Vec<Include>, TransportError> {
        let includes = self.client.class_includes(url)?;
        if includes.is_empty() {
            return Ok(vec![main_include("CLAS/OC", name, url)]);
        }
        Ok(includes
            .into_iter()
            .map(|(kind, source_url)| Include {
                include_type: CLASS_INCLUDE_TYPE.to_string(),
                name: name.to_string(),
                part: Some(kind),
                source_url,
                meta_url: url.to_string(),
            })
            .collect())
    }

    fn function_group(&self, name: &str) -> Result<Vec<Include>, TransportError> {
        Ok(self
            .client
            .node_structure("FUGR/F", name)?
            .into_iter()
            .filter(|n| matches!(n.object_type.as_str(), "FUGR/FF" | "FUGR/I"))
            .filter_map(|n| {
                let url = n.url?;
                Some(main_include(&n.object_type, &n.name, &url))
            })
            .collect())
    }

    fn package(&self, name: &str) -> Result<Vec<Include>, TransportError> {
        let mut includes = Vec::new();
        for child in self.client.node_structure("DEVC/K", name)? {
            if child.is_package() || !is_supported_type(&child.object_type) {
                continue;
            }
            let Some(url) = &child.url else { continue };
            includes.extend(self.expand_object(&child.object_type, &child.name, url)?);
        }
        Ok(includes)
    }
}

impl Expander for AdtExpander<'_> {
    fn expand(&self, object: &ObjectDescriptor) -> Result<Vec<Include>, TransportError> {
        let url = match &object.url {
            Some(url) => url.clone(),
            None => self.resolve_url(object)?,
        };
        let includes = self.expand_object(&object.object_type, &object.name, &url)?;
        tracing::debug!("{object} expands to {} include(s)", includes.len());
        Ok(includes)
    }
}

/// Fill in the default minor type for bare major types (`PROG` -> `PROG/P`).
pub fn normalize_type(object_type: &str) -> String {
    let upper = object_type.to_ascii_uppercase();
    if upper.contains('/') {
        return upper;
    }
    match major_type(&upper) {
        "PROG" => "PROG/P".to_string(),
        "CLAS" => "CLAS/OC".to_string(),
        "INTF" => "INTF/OI".to_string(),
        "FUGR" => "FUGR/F".to_string(),
        "DEVC" => "DEVC/K".to_string(),
        _ => upper,
    }
}

fn main_include(object_type: &str, name: &str, url: &str) -> Include {
    let meta_url = url.trim_end_matches('/').to_string();
    Include {
        include_type: object_type.to_string(),
        name: name.to_string(),
        part: None,
        source_url: format!("{meta_url}/source/main"),
        meta_url,
    }
}
