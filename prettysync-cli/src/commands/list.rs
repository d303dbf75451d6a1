//! `prettysync list`: show the objects a sync would process.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use prettysync_adt::{AdtClient, AdtDiscovery};
use prettysync_core::ObjectDescriptor;

use super::connection::{ConnectionArgs, Unconnected};
use super::selection::SelectionArgs;

/// Arguments for `prettysync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        // Manifest listings need no server; queries surface the resolution error.
        let objects = match self.connection.resolve() {
            Ok(config) => {
                let client = AdtClient::new(config);
                self.selection.objects(&AdtDiscovery::new(&client))?
            }
            Err(err) => self.selection.objects(&Unconnected::new(&err))?,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows(&objects))?);
            return Ok(());
        }
        if objects.is_empty() {
            println!("No objects selected.");
            return Ok(());
        }
        let mut table = Table::new(rows(&objects));
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

#[derive(Tabled, Serialize)]
struct ObjectRow {
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    object_type: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "url")]
    url: String,
}

fn rows(objects: &[ObjectDescriptor]) -> Vec<ObjectRow> {
    objects
        .iter()
        .map(|o| ObjectRow {
            object_type: o.object_type.clone(),
            name: o.name.clone(),
            url: o.url.clone().unwrap_or_default(),
        })
        .collect()
}
