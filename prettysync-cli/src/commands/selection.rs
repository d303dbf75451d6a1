//! Object selection flags shared by `sync` and `list`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use prettysync_core::{Discovery, ObjectDescriptor};
use prettysync_sync::listing::{self, ListRequest};

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Object type to query, e.g. DEVC/K or PROG/P.
    #[arg(long = "type", value_name = "TYPE")]
    pub object_type: Option<String>,

    /// Object name to query.
    #[arg(long)]
    pub name: Option<String>,

    /// Include sub-packages when querying a package.
    #[arg(long)]
    pub recursive: bool,

    /// Read the object list from a manifest file instead of querying.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

impl SelectionArgs {
    pub fn request(&self) -> ListRequest {
        ListRequest {
            object_type: self.object_type.clone(),
            name: self.name.clone(),
            file: self.manifest.clone(),
            recursive: self.recursive,
        }
    }

    /// Resolve the selection, reporting each queried container on stderr.
    pub fn objects(&self, discovery: &dyn Discovery) -> Result<Vec<ObjectDescriptor>> {
        let mut progress = |container: &str| {
            eprintln!("{} {container}", "querying".dimmed());
        };
        listing::list(discovery, &self.request(), &mut progress)
            .context("failed to build the object list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_every_flag() {
        let args = SelectionArgs {
            object_type: Some("DEVC/K".into()),
            name: Some("ZPKG".into()),
            recursive: true,
            manifest: None,
        };
        assert_eq!(
            args.request(),
            ListRequest {
                object_type: Some("DEVC/K".into()),
                name: Some("ZPKG".into()),
                file: None,
                recursive: true,
            }
        );
    }
}
