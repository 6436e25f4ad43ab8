//! CLI command implementations.

pub(crate) mod batch;
pub(crate) mod check;
pub(crate) mod inspect;
pub(crate) mod sync;

pub(crate) use batch::BatchArgs;
pub(crate) use check::CheckArgs;
pub(crate) use inspect::InspectArgs;
pub(crate) use sync::SyncArgs;

use std::path::{Path, PathBuf};

use clap::Args;
use wpsync_config::Config;
use wpsync_elementor::FieldEdit;
use wpsync_wordpress::WordPressClient;

use crate::error::CliError;
use crate::output::Output;

/// Flags shared by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// Path to configuration file (default: auto-discover wpsync.toml).
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Enable verbose output (show request and verification logs).
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Build a REST client, explaining the missing section if there is none.
fn create_client(config: &Config, output: &Output) -> Result<WordPressClient, CliError> {
    if config.wordpress.is_none() {
        output.error("Error: wordpress configuration required in wpsync.toml");
        output.info("\nAdd the following to your wpsync.toml:");
        output.info("\n[wordpress]");
        output.info(r#"base_url = "https://blog.example.com""#);
        output.info(r#"username = "editor""#);
        output.info(r#"app_password = "${WP_APP_PASSWORD}""#);
    }
    let wordpress = config.require_wordpress()?;
    Ok(WordPressClient::from_config(wordpress))
}

/// Read the replacement text; trailing whitespace is dropped.
fn read_text(path: &Path) -> Result<String, CliError> {
    let text = std::fs::read_to_string(path)?;
    let text = text.trim_end();
    if text.is_empty() {
        return Err(CliError::Validation(format!(
            "{} is empty; refusing to blank the post",
            path.display()
        )));
    }
    Ok(text.to_owned())
}

fn print_edits(output: &Output, edits: &[FieldEdit]) {
    for edit in edits {
        let marker = if edit.changed() { "->" } else { "==" };
        output.info(&format!("  {marker} {} ({})", edit.node_id, edit.key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_text_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.html");
        std::fs::write(&path, "<p>New text</p>\n\n").unwrap();

        assert_eq!(read_text(&path).unwrap(), "<p>New text</p>");
    }

    #[test]
    fn test_read_text_rejects_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.html");
        std::fs::write(&path, " \n").unwrap();

        assert!(matches!(read_text(&path), Err(CliError::Validation(_))));
    }
}
