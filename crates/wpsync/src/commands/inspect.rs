//! `wpsync inspect` command implementation.

use clap::Args;
use tracing::info;
use wpsync_config::{CliSettings, Config};
use wpsync_wordpress::{
    DocumentState, InspectReport, PostSynchronizer, REGISTER_META_SNIPPET, SyncOptions,
};

use super::{CommonArgs, create_client};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the inspect command.
#[derive(Args)]
pub(crate) struct InspectArgs {
    /// Post ID to inspect.
    post_id: u64,

    /// Widget type to mark as eligible; repeat for several (overrides config).
    #[arg(short, long = "widget")]
    widgets: Vec<String>,

    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

impl InspectArgs {
    /// Execute the inspect command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or the fetch fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = CliSettings {
            widgets: (!self.widgets.is_empty()).then(|| self.widgets.clone()),
            ..Default::default()
        };
        let config = Config::load(self.common.config.as_deref(), Some(&settings))?;
        let client = create_client(&config, &output)?;
        let options = SyncOptions::from_config(&config)?;

        info!(post_id = self.post_id, "Inspecting post");
        let report = PostSynchronizer::new(&client, options).inspect(self.post_id)?;
        print_report(&output, &report);
        Ok(())
    }
}

fn print_report(output: &Output, report: &InspectReport) {
    output.highlight(&format!("Post {}", report.post_id));
    output.field("Status", report.status.as_str());
    output.field("Modified", &report.modified);
    if let Some(link) = &report.link {
        output.field("URL", link);
    }
    output.field("Edit mode", report.edit_mode.as_deref().unwrap_or("(none)"));
    match (report.revision_count, &report.latest_revision) {
        (Some(count), Some(latest)) => output.field(
            "Revisions",
            &format!("{count} (latest #{} at {})", latest.id, latest.modified),
        ),
        (Some(count), None) => output.field("Revisions", &count.to_string()),
        (None, _) => output.field("Revisions", "(not listed by the site)"),
    }

    match &report.document {
        DocumentState::NotExposed => {
            output.warning("\nPage-builder meta fields are not exposed by the REST API.");
            output.info("Updates cannot reach the builder document until they are registered:\n");
            output.info(REGISTER_META_SNIPPET);
        }
        DocumentState::Absent => {
            output.info("\nNo builder document; sync writes the native content field.");
        }
        DocumentState::Present {
            sections,
            nodes,
            post_content_widget,
            fields,
        } => {
            output.field("Sections", &sections.to_string());
            output.field("Elements", &nodes.to_string());
            if *post_content_widget {
                output.info("A post-content widget renders the native content; sync keeps it in step.");
            }

            let selected = fields.iter().filter(|f| f.selected).count();
            output.info(&format!(
                "\nEditable fields ({}, {selected} selected):",
                fields.len()
            ));
            output.separator();
            for field in fields {
                let marker = if field.selected { "*" } else { " " };
                output.info(&format!(
                    "{marker} {} [{}.{}] {}",
                    field.node_id, field.kind, field.key, field.preview
                ));
            }
            if selected == 0 {
                output.warning("\nNo field is eligible; sync would write nothing.");
            }
        }
    }
}
