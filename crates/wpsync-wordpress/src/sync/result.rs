//! Result types for synchronization operations.

use wpsync_elementor::{FieldEdit, WidgetKind};

use crate::types::{PostStatus, RevisionRecord};

/// Result of a verified write.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Post id.
    pub post_id: u64,
    /// Verified status.
    pub status: PostStatus,
    /// Verified modification time.
    pub modified: String,
    /// Public URL.
    pub link: Option<String>,
    /// Field replacements written.
    pub edits: Vec<FieldEdit>,
    /// Whether the native content field was written too.
    pub native_content_updated: bool,
    /// Cache flush result; `None` when no flush is configured.
    pub flushed: Option<bool>,
}

/// How a synchronization cycle ended.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Builder document written and verified.
    Updated(SyncReport),
    /// The document has no field eligible for replacement; nothing written.
    NoEligibleFields,
    /// Plain post without a builder document: native content written and verified.
    NativeContentOnly(SyncReport),
}

/// Result of a dry run (no changes made).
#[derive(Debug, Clone)]
pub struct DryRunResult {
    /// Post id.
    pub post_id: u64,
    /// Status before the update.
    pub current_status: PostStatus,
    /// Status the update would set.
    pub target_status: PostStatus,
    /// Field replacements that would be written.
    pub edits: Vec<FieldEdit>,
    /// Whether only native content would be written (plain post).
    pub native_only: bool,
    /// Whether native content would be written.
    pub native_content: bool,
    /// Size of the re-encoded document in bytes.
    pub encoded_len: Option<usize>,
}

/// Read-only diagnostics of a post.
#[derive(Debug, Clone)]
pub struct InspectReport {
    /// Post id.
    pub post_id: u64,
    /// Current status.
    pub status: PostStatus,
    /// Last modification time.
    pub modified: String,
    /// Public URL.
    pub link: Option<String>,
    /// `_elementor_edit_mode` value.
    pub edit_mode: Option<String>,
    /// Builder document state.
    pub document: DocumentState,
    /// Number of stored revisions; `None` if the site does not list them.
    pub revision_count: Option<usize>,
    /// Newest stored revision.
    pub latest_revision: Option<RevisionRecord>,
}

/// Builder document as seen by [`InspectReport`].
#[derive(Debug, Clone)]
pub enum DocumentState {
    /// Meta fields are not exposed over REST.
    NotExposed,
    /// Plain post.
    Absent,
    /// Decoded document.
    Present {
        /// Top-level elements.
        sections: usize,
        /// All elements.
        nodes: usize,
        /// Whether a widget renders the native content.
        post_content_widget: bool,
        /// Every editable field, in traversal order.
        fields: Vec<FieldPreview>,
    },
}

/// An editable field with a text preview.
#[derive(Debug, Clone)]
pub struct FieldPreview {
    /// Widget node id.
    pub node_id: String,
    /// Widget kind.
    pub kind: WidgetKind,
    /// Settings key.
    pub key: &'static str,
    /// Start of the current text, tags removed.
    pub preview: String,
    /// Whether a sync with the current options would replace it.
    pub selected: bool,
}
