//! Live object discovery.
//!
//! Packages are listed through the node structure service; anything else is
//! looked up by quick search and matched on its exact name.

use prettysync_core::types::{is_supported_type, major_type};
use prettysync_core::{Discovery, ObjectDescriptor, TransportError};

use crate::client::AdtClient;
use crate::expand::normalize_type;

pub struct AdtDiscovery<'a> {
    client: &'a AdtClient,
}

impl<'a> AdtDiscovery<'a> {
    pub fn new(client: &'a AdtClient) -> Self {
        Self { client }
    }

    fn package_contents(
        &self,
        name: &str,
        recursive: bool,
        progress: &mut dyn FnMut(&str),
        out: &mut Vec<ObjectDescriptor>,
    ) -> Result<(), TransportError> {
        progress(name);
        for child in self.client.node_structure("DEVC/K", name)? {
            if !is_supported_type(&child.object_type) {
                tracing::debug!("skipping {child}: unsupported type");
            } else if !child.is_package() {
                out.push(child);
            } else if recursive {
                self.package_contents(&child.name, recursive, progress, out)?;
            } else {
                tracing::debug!("skipping sub-package {}", child.name);
            }
        }
        Ok(())
    }
}

impl Discovery for AdtDiscovery<'_> {
    fn list(
        &self,
        object_type: &str,
        name: &str,
        recursive: bool,
        progress: &mut dyn FnMut(&str),
    ) -> Result<Vec<ObjectDescriptor>, TransportError> {
        let object_type = normalize_type(object_type);
        let mut objects = Vec::new();
        if object_type == "DEVC/K" {
            self.package_contents(&name.to_ascii_uppercase(), recursive, progress, &mut objects)?;
            return Ok(objects);
        }

        progress(name);
        let major = major_type(&object_type).to_string();
        objects.extend(
            self.client
                .search_objects(name, Some(&object_type))?
                .into_iter()
                .filter(|o| o.name.eq_ignore_ascii_case(name))
                .filter(|o| major_type(&o.object_type).eq_ignore_ascii_case(&major)),
        );
        Ok(objects)
    }
}
