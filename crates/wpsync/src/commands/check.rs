//! `wpsync check` command implementation.

use clap::Args;
use tracing::info;
use wpsync_config::Config;
use wpsync_wordpress::{SiteReport, check_site};

use super::{CommonArgs, create_client};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the site is not ready.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.common.config.as_deref(), None)?;
        let client = create_client(&config, &output)?;
        let base_url = config.require_wordpress()?.normalized_base_url();

        output.info(&format!("Checking {base_url}..."));
        info!(site = %base_url, "Checking site");
        let report = check_site(&client);
        print_report(&output, &report);

        if !report.is_ready() {
            return Err(CliError::Validation(format!(
                "{base_url} is not ready for sync"
            )));
        }
        output.success("\nSite is ready for sync.");
        Ok(())
    }
}

fn print_report(output: &Output, report: &SiteReport) {
    output.separator();
    if let Some(name) = &report.site_name {
        output.field("Site", name);
    }
    if !report.namespaces.is_empty() {
        output.field("Namespaces", &report.namespaces.join(", "));
    }
    if let Some(user) = &report.user {
        output.field("User", &format!("{} (id {})", user.name, user.id));
    }
    output.separator();

    for problem in &report.problems {
        if problem.is_fatal() {
            output.error(&format!("  {problem}"));
        } else {
            output.warning(&format!("  {problem}"));
        }
        output.info(&format!("    {}", problem.guidance()));
    }
}
