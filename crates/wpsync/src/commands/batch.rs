//! `wpsync batch` command implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use tracing::info;
use wpsync_config::{CliSettings, Config, PublishMode};
use wpsync_wordpress::{BatchJob, PostSynchronizer, SyncOptions, SyncOutcome};

use super::{CommonArgs, create_client, read_text};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the batch command.
#[derive(Args)]
pub(crate) struct BatchArgs {
    /// TOML manifest listing `[[post]]` entries with `id` and `text_file`.
    manifest: PathBuf,

    /// Target status: draft or publish (overrides config).
    #[arg(short, long)]
    mode: Option<PublishMode>,

    /// Skip the configured cache flush.
    #[arg(long)]
    no_flush: bool,

    #[command(flatten)]
    pub(crate) common: CommonArgs,
}

/// Batch manifest file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default, rename = "post")]
    posts: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    id: u64,
    /// Relative paths resolve against the manifest's directory.
    text_file: PathBuf,
}

impl BatchArgs {
    /// Execute the batch command.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be loaded or any post failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = CliSettings {
            mode: self.mode,
            no_flush: self.no_flush,
            ..Default::default()
        };
        let config = Config::load(self.common.config.as_deref(), Some(&settings))?;
        let client = create_client(&config, &output)?;
        let options = SyncOptions::from_config(&config)?;

        let jobs = load_jobs(&self.manifest)?;
        output.info(&format!(
            "Syncing {} post(s) from {}...",
            jobs.len(),
            self.manifest.display()
        ));

        let synchronizer = PostSynchronizer::new(&client, options);
        let results = synchronizer.sync_batch(&jobs);

        output.separator();
        let mut failed = 0;
        for result in &results {
            let post_id = result.post_id;
            match &result.result {
                Ok(outcome) => info!(post_id, outcome = outcome_label(outcome), "Batch post done"),
                Err(err) => info!(post_id, error = %err, "Batch post failed"),
            }
            match &result.result {
                Ok(SyncOutcome::Updated(report)) => output.success(&format!(
                    "  {}: {} ({} field(s))",
                    result.post_id,
                    report.status,
                    report.edits.len()
                )),
                Ok(SyncOutcome::NativeContentOnly(report)) => output.success(&format!(
                    "  {}: {} (native content)",
                    result.post_id, report.status
                )),
                Ok(SyncOutcome::NoEligibleFields) => output.warning(&format!(
                    "  {}: no eligible fields, skipped",
                    result.post_id
                )),
                Err(err) => {
                    failed += 1;
                    output.error(&format!("  {}: {err}", result.post_id));
                }
            }
        }
        output.separator();
        info!(posts = results.len(), failed, "Batch finished");

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} post(s) failed",
                results.len()
            )));
        }
        output.success(&format!("All {} post(s) synchronized.", results.len()));
        Ok(())
    }
}

fn outcome_label(outcome: &SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Updated(_) => "updated",
        SyncOutcome::NativeContentOnly(_) => "native content",
        SyncOutcome::NoEligibleFields => "skipped",
    }
}

/// Parse a manifest and read every text file it names.
///
/// Each post id may appear once.
fn load_jobs(path: &Path) -> Result<Vec<BatchJob>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&content)?;
    if manifest.posts.is_empty() {
        return Err(CliError::Validation(format!(
            "{} lists no [[post]] entries",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    for entry in &manifest.posts {
        if !seen.insert(entry.id) {
            return Err(CliError::Validation(format!(
                "{} lists post {} more than once",
                path.display(),
                entry.id
            )));
        }
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    manifest
        .posts
        .into_iter()
        .map(|entry| {
            Ok(BatchJob {
                post_id: entry.id,
                text: read_text(&base.join(&entry.text_file))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_jobs_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("texts")).unwrap();
        std::fs::write(dir.path().join("texts/a.html"), "<p>First</p>\n").unwrap();
        std::fs::write(dir.path().join("b.html"), "<p>Second</p>").unwrap();
        let manifest = dir.path().join("posts.toml");
        std::fs::write(
            &manifest,
            r#"
[[post]]
id = 42
text_file = "texts/a.html"

[[post]]
id = 43
text_file = "b.html"
"#,
        )
        .unwrap();

        let jobs = load_jobs(&manifest).unwrap();

        let summary: Vec<(u64, &str)> = jobs.iter().map(|j| (j.post_id, j.text.as_str())).collect();
        assert_eq!(summary, vec![(42, "<p>First</p>"), (43, "<p>Second</p>")]);
    }

    #[test]
    fn test_load_jobs_rejects_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("posts.toml");
        std::fs::write(&manifest, "").unwrap();

        assert!(matches!(load_jobs(&manifest), Err(CliError::Validation(_))));
    }

    #[test]
    fn test_load_jobs_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("posts.toml");
        std::fs::write(&manifest, "[[post]]\nid = 1\ntext = \"inline\"\n").unwrap();

        assert!(matches!(load_jobs(&manifest), Err(CliError::Manifest(_))));
    }

    #[test]
    fn test_load_jobs_rejects_repeated_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>Alpha</p>").unwrap();
        std::fs::write(dir.path().join("b.html"), "<p>Bravo</p>").unwrap();
        let manifest = dir.path().join("posts.toml");
        std::fs::write(
            &manifest,
            "[[post]]\nid = 42\ntext_file = \"a.html\"\n\n[[post]]\nid = 42\ntext_file = \"b.html\"\n",
        )
        .unwrap();

        let err = load_jobs(&manifest).unwrap_err();

        assert!(matches!(&err, CliError::Validation(msg) if msg.contains("post 42 more than once")));
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(&SyncOutcome::NoEligibleFields), "skipped");
    }

    #[test]
    fn test_load_jobs_missing_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("posts.toml");
        std::fs::write(&manifest, "[[post]]\nid = 1\ntext_file = \"missing.html\"\n").unwrap();

        assert!(matches!(load_jobs(&manifest), Err(CliError::Io(_))));
    }
}
