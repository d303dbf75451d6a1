//! `prettysync sync`: reformat the selected objects and write back changes.

use std::cell::RefCell;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use prettysync_adt::{AdtClient, AdtDiscovery, AdtExpander};
use prettysync_core::{Include, ObjectDescriptor, SyncOptions};
use prettysync_format::select;
use prettysync_sync::{IncludeOutcome, SourceSync, SyncError, SyncObserver, SyncStats};

use super::connection::{ConnectionArgs, Unconnected};
use super::selection::SelectionArgs;

/// Arguments for `prettysync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Lock and validate every changed include, but write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Tracking id (transport request) to write under.
    #[arg(long, value_name = "ID")]
    pub tracking_id: Option<String>,

    /// Format with an external linter configured in this file instead of
    /// the server's pretty printer.
    #[arg(long, value_name = "FILE")]
    pub lint_config: Option<PathBuf>,

    /// Print the run report as JSON instead of progress lines.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let client = match self.connection.resolve() {
            Ok(config) => AdtClient::new(config),
            Err(err) => {
                // A bad selection is reported ahead of the missing connection.
                self.selection.objects(&Unconnected::new(&err))?;
                return Err(err);
            }
        };
        let objects = self.selection.objects(&AdtDiscovery::new(&client))?;
        tracing::info!(objects = objects.len(), dry_run = self.dry_run, "starting sync");

        let expander = AdtExpander::new(&client);
        let formatter = select(&client, self.lint_config.as_deref())
            .context("failed to set up the formatter")?;
        let console = ConsoleObserver {
            dry_run: self.dry_run,
        };
        let collector = ReportCollector::default();
        let observer: &dyn SyncObserver = if self.json { &collector } else { &console };
        let options = SyncOptions {
            dry_run: self.dry_run,
            tracking_id: self.tracking_id,
        };

        let stats = SourceSync::new(&client, &expander, formatter.as_ref())
            .with_observer(observer)
            .process_objects(&objects, &options)
            .context("sync failed")?;

        if self.json {
            let report = RunReport {
                dry_run: self.dry_run,
                includes: collector.rows.into_inner(),
                stats,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON run report
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunReport {
    dry_run: bool,
    includes: Vec<IncludeRow>,
    stats: SyncStats,
}

#[derive(Debug, Serialize)]
struct IncludeRow {
    #[serde(flatten)]
    include: Include,
    outcome: IncludeOutcome,
}

/// Collects per-include outcomes for the JSON report.
#[derive(Default)]
struct ReportCollector {
    rows: RefCell<Vec<IncludeRow>>,
}

impl SyncObserver for ReportCollector {
    fn on_include(&self, include: &Include, outcome: IncludeOutcome) {
        self.rows.borrow_mut().push(IncludeRow {
            include: include.clone(),
            outcome,
        });
    }

    fn on_failure(
        &self,
        object: Option<&ObjectDescriptor>,
        include: Option<&Include>,
        _error: &SyncError,
    ) {
        print_failure(object, include);
    }
}

fn print_failure(object: Option<&ObjectDescriptor>, include: Option<&Include>) {
    let at = match (object, include) {
        (_, Some(include)) => include.to_string(),
        (Some(object), None) => object.to_string(),
        (None, None) => "session setup".to_string(),
    };
    eprintln!("{} failed at {at}", "✗".red());
}

// ---------------------------------------------------------------------------
// Console progress
// ---------------------------------------------------------------------------

struct ConsoleObserver {
    dry_run: bool,
}

impl ConsoleObserver {
    fn prefix(&self) -> &'static str {
        if self.dry_run {
            "[dry-run] "
        } else {
            ""
        }
    }
}

impl SyncObserver for ConsoleObserver {
    fn on_object(&self, object: &ObjectDescriptor) {
        println!("{}{}", self.prefix(), object.to_string().bold());
    }

    fn on_include(&self, include: &Include, outcome: IncludeOutcome) {
        println!("{}", include_line(include, outcome));
    }

    fn on_failure(
        &self,
        object: Option<&ObjectDescriptor>,
        include: Option<&Include>,
        _error: &SyncError,
    ) {
        print_failure(object, include);
    }

    fn on_summary(&self, stats: &SyncStats) {
        println!("{}{}", self.prefix(), stats.summary());
    }
}

fn include_line(include: &Include, outcome: IncludeOutcome) -> String {
    match outcome {
        IncludeOutcome::Written => format!("  ✎  {include}"),
        IncludeOutcome::WouldWrite => format!("  ~  {include}"),
        IncludeOutcome::Unchanged => format!("  ·  {include}"),
        IncludeOutcome::Generated => format!("  ·  {include} ({})", outcome.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn include() -> Include {
        Include {
            include_type: "PROG/P".into(),
            name: "ZREPORT".into(),
            part: None,
            source_url: "/p/zreport/source/main".into(),
            meta_url: "/p/zreport".into(),
        }
    }

    #[test]
    fn include_lines_use_outcome_symbols() {
        assert_eq!(
            include_line(&include(), IncludeOutcome::Written),
            "  ✎  PROG/P ZREPORT"
        );
        assert_eq!(
            include_line(&include(), IncludeOutcome::WouldWrite),
            "  ~  PROG/P ZREPORT"
        );
        assert_eq!(
            include_line(&include(), IncludeOutcome::Generated),
            "  ·  PROG/P ZREPORT (generated, skipped)"
        );
    }

    #[test]
    fn collector_rows_serialize_with_outcome() {
        let collector = ReportCollector::default();
        collector.on_include(&include(), IncludeOutcome::WouldWrite);
        collector.on_include(&include(), IncludeOutcome::Generated);

        let rows = serde_json::to_value(&*collector.rows.borrow()).unwrap();
        assert_eq!(rows[0]["type"], "PROG/P");
        assert_eq!(rows[0]["name"], "ZREPORT");
        assert_eq!(rows[0]["outcome"], "would_write");
        assert_eq!(rows[1]["outcome"], "generated");
        assert!(rows[0].get("part").is_none());
    }

    #[test]
    fn dry_run_prefixes_headlines() {
        assert_eq!(ConsoleObserver { dry_run: true }.prefix(), "[dry-run] ");
        assert_eq!(ConsoleObserver { dry_run: false }.prefix(), "");
    }
}
