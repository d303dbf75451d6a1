//! prettysync: reformat remote source and write it back safely.
//!
//! # Usage
//!
//! ```text
//! prettysync sync --type DEVC/K --name ZPKG [--recursive] [--dry-run] [--tracking-id ID] [--lint-config FILE]
//! prettysync sync --manifest objects.txt [--dry-run] [--tracking-id ID]
//! prettysync list --type DEVC/K --name ZPKG [--recursive] [--json]
//! prettysync list --manifest objects.txt [--json]
//! ```
//!
//! Connection settings come from `--connection <profile>` in
//! `~/.prettysync/connections.yaml`, overridden by `--url`, `--user`,
//! `--password`, `--client` (or `PRETTYSYNC_*` environment variables).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{list::ListArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "prettysync",
    version,
    about = "Pretty-print remote repository source and write it back under lock",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reformat every include of the selected objects and write back changes.
    Sync(SyncArgs),

    /// Show the objects a sync would process.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::List(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
