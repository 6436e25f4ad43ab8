//! wpsync CLI - Elementor-aware WordPress content sync.
//!
//! Provides commands for:
//! - `sync`: Replace the text of a post's widgets and verify the write
//! - `batch`: Synchronize the posts listed in a manifest
//! - `inspect`: Show what a sync would see, without writing
//! - `check`: Check REST discovery and credentials

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wpsync_wordpress::REGISTER_META_SNIPPET;

use commands::{BatchArgs, CheckArgs, InspectArgs, SyncArgs};
use output::Output;

/// wpsync - Elementor-aware WordPress content sync.
#[derive(Parser)]
#[command(name = "wpsync", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace widget text of a post and verify the result.
    Sync(SyncArgs),
    /// Synchronize every post listed in a TOML manifest.
    Batch(BatchArgs),
    /// Show a post's builder document and sync eligibility.
    Inspect(InspectArgs),
    /// Check that the site's REST API and credentials are usable.
    Check(CheckArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Sync(args) => args.common.verbose,
            Self::Batch(args) => args.common.verbose,
            Self::Inspect(args) => args.common.verbose,
            Self::Check(args) => args.common.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Sync(args) => args.execute(),
        Commands::Batch(args) => args.execute(),
        Commands::Inspect(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        if let Some(revision) = err.latest_revision() {
            output.field(
                "Latest revision",
                &format!("#{} at {}", revision.id, revision.modified),
            );
        }
        if let Some(guidance) = err.guidance() {
            output.info(&format!("\n{guidance}"));
        }
        if err.needs_meta_registration() {
            output.info("\nRegister the fields with a must-use plugin:\n");
            output.info(REGISTER_META_SNIPPET);
        }
        std::process::exit(1);
    }
}
