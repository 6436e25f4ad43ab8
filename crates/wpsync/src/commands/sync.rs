//! `wpsync sync` command implementation.

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use wpsync_config::{CliSettings, Config, PublishMode, SelectionMode};
use wpsync_elementor::Selection;
use wpsync_wordpress::{DryRunResult, PostStatus, PostSynchronizer, SyncOptions, SyncOutcome, SyncReport};

use super::{CommonArgs, create_client, print_edits, read_text};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sync command.
#[derive(Args)]
pub(crate) struct SyncArgs {
    /// Post ID to update.
    post_id: u64,

    /// File holding the new text (HTML for rich-text widgets).
    text_file: PathBuf,

    /// Target status: draft or publish (overrides config).
    #[arg(short, long)]
    mode: Option<PublishMode>,

    /// Widget type eligible for replacement; repeat for several (overrides config).
    #[arg(short, long = "widget")]
    widgets: Vec<String>,

    /// Replace only the first eligible field.
    #[arg(long, conflicts_with_all = ["placeholder", "node"])]
    first: bool,

    /// Replace only fields whose current text contains this marker.
    #[arg(long, conflicts_with = "node")]
    placeholder: Option<String>,

    /// Replace only the field of the widget with this element id.
    #[arg(long)]
    node: Option<String>,

    /// Preview changes without writing to WordPress.
    #[arg(long)]
    dry_run: bool,

    /// Skip the configured cache flush.
    #[arg(long)]
    no_flush: bool,

    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

impl SyncArgs {
    /// Execute the sync command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, the text file or the sync cycle fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.common.config.as_deref(), Some(&self.cli_settings()))?;
        let client = create_client(&config, &output)?;
        let mut options = SyncOptions::from_config(&config)?;
        if let Some(node) = &self.node {
            options.selection = Selection::NodeId(node.clone());
        }

        let text = read_text(&self.text_file)?;
        output.info(&format!(
            "Syncing {} into post {}...",
            self.text_file.display(),
            self.post_id
        ));

        info!(
            post_id = self.post_id,
            dry_run = self.dry_run,
            selection = ?options.selection,
            "Starting sync"
        );
        let synchronizer = PostSynchronizer::new(&client, options);
        if self.dry_run {
            let result = synchronizer.dry_run(self.post_id, &text)?;
            print_dry_run_result(&output, &result);
        } else {
            let outcome = synchronizer.sync(self.post_id, &text)?;
            print_outcome(&output, self.post_id, &outcome);
        }

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            mode: self.mode,
            widgets: (!self.widgets.is_empty()).then(|| self.widgets.clone()),
            selection: self.first.then_some(SelectionMode::First),
            placeholder: self.placeholder.clone(),
            no_flush: self.no_flush,
        }
    }
}

fn print_dry_run_result(output: &Output, result: &DryRunResult) {
    output.highlight("\n[DRY RUN] No changes made.");
    output.field("Post", &result.post_id.to_string());
    output.field(
        "Status",
        &format!("{} -> {}", result.current_status, result.target_status),
    );

    if result.native_only {
        output.info("\nNo builder document; native content would be replaced.");
        return;
    }
    if result.edits.is_empty() {
        output.warning("\nNo eligible fields; nothing would be written.");
        return;
    }

    output.info(&format!("\nFields ({}):", result.edits.len()));
    print_edits(output, &result.edits);
    if let Some(len) = result.encoded_len {
        output.field("\nEncoded document", &format!("{len} bytes"));
    }
    if result.native_content {
        output.info("Native content would be replaced too.");
    }
}

fn print_outcome(output: &Output, post_id: u64, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Updated(report) => {
            output.success("\nPost updated and verified.");
            print_report(output, report);
            output.info(&format!("\nFields ({}):", report.edits.len()));
            print_edits(output, &report.edits);
        }
        SyncOutcome::NativeContentOnly(report) => {
            output.success("\nPost content updated and verified (no builder document).");
            print_report(output, report);
        }
        SyncOutcome::NoEligibleFields => {
            output.warning(&format!(
                "\nPost {post_id} has no eligible fields; nothing written."
            ));
        }
    }
}

fn print_report(output: &Output, report: &SyncReport) {
    output.field("ID", &report.post_id.to_string());
    output.field("Status", report.status.as_str());
    output.field("Modified", &report.modified);
    if let Some(link) = &report.link {
        output.field("URL", link);
    }
    match report.flushed {
        Some(true) => output.field("Cache", "flushed"),
        Some(false) => output.warning("Cache flush failed; the public page may lag behind."),
        None => {}
    }
    if report.status == PostStatus::Draft {
        output.info("\nThe post is now a draft. Review it in the editor and publish it there.");
    }
}
