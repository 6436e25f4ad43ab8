//! Post synchronization workflow.
//!
//! This module provides the [`PostSynchronizer`] struct that encapsulates the
//! entire workflow for replacing the text of a builder-managed post:
//!
//! 1. Fetch the post in edit context
//! 2. Check that the builder meta fields are exposed
//! 3. Decode the builder document and locate eligible widgets
//! 4. Replace their text and re-encode the document
//! 5. Write the update with an explicit status
//! 6. Read the post back and verify the live row changed
//! 7. Flush caches (best effort)
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use wpsync_config::Config;
//! use wpsync_wordpress::{PostSynchronizer, SyncOptions, SyncOutcome, WordPressClient};
//!
//! let config = Config::load(None, None)?;
//! let client = WordPressClient::from_config(config.require_wordpress()?);
//! let synchronizer = PostSynchronizer::new(&client, SyncOptions::from_config(&config)?);
//!
//! // Preview first
//! let preview = synchronizer.dry_run(42, "<p>New text</p>")?;
//!
//! // Then write and verify
//! if let SyncOutcome::Updated(report) = synchronizer.sync(42, "<p>New text</p>")? {
//!     println!("post {} is now {}", report.post_id, report.status);
//! }
//! # Ok(())
//! # }
//! ```

mod batch;
mod error;
mod executor;
mod result;

pub use batch::{BatchJob, BatchResult};
pub use error::SyncError;
pub use executor::PostSynchronizer;
pub use result::{DocumentState, DryRunResult, FieldPreview, InspectReport, SyncOutcome, SyncReport};

use wpsync_config::{Config, PublishMode, SelectionMode};
use wpsync_elementor::{DocumentError, FieldEdit, Selection, WidgetKind};

use crate::cache::CacheFlush;
use crate::types::UpdateRequest;

/// Options threaded into a [`PostSynchronizer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Target status.
    pub mode: PublishMode,
    /// Widget kinds whose text is replaced.
    pub widgets: Vec<WidgetKind>,
    /// Tie-break rule for several eligible fields.
    pub selection: Selection,
    /// Keep an existing outer `<div>` of rich text.
    pub preserve_wrapper: bool,
    /// Also write the text into the native content field.
    pub update_native_content: bool,
    /// Also check the public rendering after the write.
    pub verify_rendered: bool,
    /// Flush actions run after a verified write.
    pub cache: Vec<CacheFlush>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: PublishMode::Draft,
            widgets: vec![WidgetKind::RichText],
            selection: Selection::All,
            preserve_wrapper: true,
            update_native_content: true,
            verify_rendered: false,
            cache: Vec::new(),
        }
    }
}

impl SyncOptions {
    /// Build options from the loaded configuration.
    ///
    /// A configured placeholder takes precedence over `sync.selection`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedWidget`] if `sync.widgets` names a
    /// widget type without an editable text field.
    pub fn from_config(config: &Config) -> Result<Self, DocumentError> {
        let widgets = config
            .sync
            .widgets
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<WidgetKind>, _>>()?;

        let selection = match (&config.sync.placeholder, config.sync.selection) {
            (Some(placeholder), _) => Selection::Containing(placeholder.clone()),
            (None, SelectionMode::All) => Selection::All,
            (None, SelectionMode::First) => Selection::First,
        };

        Ok(Self {
            mode: config.sync.mode,
            widgets,
            selection,
            preserve_wrapper: config.sync.preserve_wrapper,
            update_native_content: config.sync.update_native_content,
            verify_rendered: config.verify.rendered,
            cache: CacheFlush::from_config(&config.cache),
        })
    }
}

/// One synchronization attempt, from the prepared write to its verification.
#[derive(Debug, Clone)]
pub struct UpdateTransaction {
    /// Target post.
    pub post_id: u64,
    /// Field replacements applied to the document.
    pub edits: Vec<FieldEdit>,
    /// Request to write; carries the target status.
    pub request: UpdateRequest,
    /// Modification time before the write.
    pub previous_modified: String,
    /// Encoded document before the write.
    pub previous_builder_data: Option<String>,
}

impl UpdateTransaction {
    /// Whether only native fields are written (plain post).
    #[must_use]
    pub fn is_native_only(&self) -> bool {
        self.request.builder_data().is_none()
    }
}
