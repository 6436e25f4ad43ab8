//! Read-back verification of a written update.
//!
//! A 200 response only says WordPress accepted the request. Whether the live
//! row changed is established by fetching the post again and comparing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use wpsync_elementor::Document;

use crate::sync::UpdateTransaction;
use crate::types::{BuilderData, PostRecord, PostStatus, RevisionRecord};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Longest marker searched for in rendered HTML.
const MARKER_MAX_CHARS: usize = 40;
/// Shorter text is too likely to match by accident.
const MARKER_MIN_CHARS: usize = 4;

/// Server-side registration the sync needs, for `mu-plugins/`.
pub const REGISTER_META_SNIPPET: &str = r"<?php
add_action('init', function () {
    foreach (['_elementor_data', '_elementor_edit_mode'] as $key) {
        register_post_meta('post', $key, [
            'show_in_rest'  => true,
            'single'        => true,
            'type'          => 'string',
            'auth_callback' => function () {
                return current_user_can('edit_posts');
            },
        ]);
    }
});";

/// One check that disagreed with what was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The builder meta field is not in the read-back.
    MetaMissing,
    /// The modification time did not advance.
    TimestampUnchanged {
        /// Before the update.
        before: String,
        /// After the update.
        after: String,
    },
    /// A written widget text is not in the stored document.
    TextNotFound {
        /// Widget node id.
        node_id: String,
        /// Settings key.
        key: &'static str,
    },
    /// The native content does not hold the written text (plain posts).
    ContentNotFound,
    /// The status is not the requested one.
    StatusUnchanged {
        /// Requested status.
        expected: PostStatus,
        /// Status after the update.
        actual: PostStatus,
    },
    /// The public rendering does not show the written text.
    RenderedStale,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetaMissing => f.write_str("builder meta field missing from read-back"),
            Self::TimestampUnchanged { before, after } => {
                write!(f, "modified time did not advance ({before} -> {after})")
            }
            Self::TextNotFound { node_id, key } => {
                write!(f, "written text not found at node {node_id} ({key})")
            }
            Self::ContentNotFound => f.write_str("written text not found in native content"),
            Self::StatusUnchanged { expected, actual } => {
                write!(f, "status is {actual}, expected {expected}")
            }
            Self::RenderedStale => f.write_str("rendered page does not show the new text"),
        }
    }
}

/// Most likely cause of a set of mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// The site does not register the builder meta fields for REST.
    MetaNotExposed,
    /// The meta fields are readable, but writes to them are dropped.
    MetaNotWritable,
    /// The write created a revision instead of changing the live row.
    RevisionOnly,
    /// Data is stored but the public rendering is stale.
    RendererCacheStale,
    /// Someone else changed the post between write and read-back.
    ConcurrentEdit,
    /// The requested status was not applied.
    StatusNotApplied,
}

impl Diagnosis {
    /// What the operator should do about it.
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::MetaNotExposed => {
                "Register `_elementor_data` and `_elementor_edit_mode` with `register_post_meta` (show_in_rest) on the site."
            }
            Self::MetaNotWritable => {
                "The meta fields are readable but the write was dropped; check the `auth_callback` of the meta registration."
            }
            Self::RevisionOnly => {
                "The write landed in a revision; check that no plugin intercepts REST saves of this post."
            }
            Self::RendererCacheStale => {
                "The data is stored but the page is stale; flush the Elementor CSS and page caches."
            }
            Self::ConcurrentEdit => {
                "The post changed between write and read-back; review the current version before retrying."
            }
            Self::StatusNotApplied => {
                "The status was not applied; the user may lack the `publish_posts` capability."
            }
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MetaNotExposed => "meta fields not exposed",
            Self::MetaNotWritable => "meta fields not writable",
            Self::RevisionOnly => "update landed in a revision",
            Self::RendererCacheStale => "renderer cache stale",
            Self::ConcurrentEdit => "concurrent edit",
            Self::StatusNotApplied => "status not applied",
        })
    }
}

/// Compare the edit-context read-back with the transaction.
///
/// Checks run in order: meta exposed, timestamp advanced, text present,
/// status applied.
pub(crate) fn check_write(after: &PostRecord, tx: &UpdateTransaction) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    let document = if tx.request.builder_data().is_some() {
        match after.builder_data() {
            BuilderData::NotExposed => {
                mismatches.push(Mismatch::MetaMissing);
                None
            }
            BuilderData::Absent => Some(None),
            BuilderData::Present(raw) => Some(Document::decode(raw).ok()),
        }
    } else {
        None
    };

    if after.modified <= tx.previous_modified {
        mismatches.push(Mismatch::TimestampUnchanged {
            before: tx.previous_modified.clone(),
            after: after.modified.clone(),
        });
    }

    if let Some(document) = document {
        for edit in &tx.edits {
            let stored = document
                .as_ref()
                .and_then(|doc| doc.text_of(&edit.node_id, edit.key));
            if stored != Some(edit.written.as_str()) {
                mismatches.push(Mismatch::TextNotFound {
                    node_id: edit.node_id.clone(),
                    key: edit.key,
                });
            }
        }
    } else if tx.is_native_only()
        && let Some(content) = tx.request.content()
        && !contains_marker(after.native_content.as_deref(), content)
    {
        mismatches.push(Mismatch::ContentNotFound);
    }

    if &after.status != tx.request.status() {
        mismatches.push(Mismatch::StatusUnchanged {
            expected: tx.request.status().clone(),
            actual: after.status.clone(),
        });
    }

    mismatches
}

/// Compare the view-context rendering with the written text.
pub(crate) fn check_rendered(view: &PostRecord, tx: &UpdateTransaction) -> Option<Mismatch> {
    let written = tx
        .edits
        .first()
        .map(|edit| edit.written.as_str())
        .or_else(|| tx.request.content())?;
    plain_marker(written)?;

    if contains_marker(view.rendered_content.as_deref(), written) {
        None
    } else {
        Some(Mismatch::RenderedStale)
    }
}

/// Pick the most likely cause. Earlier causes explain later symptoms.
///
/// `latest_revision` is the newest stored revision, if the site lists them.
/// A revision holding the written text while the live row lacks it means the
/// write landed in the revision.
pub(crate) fn diagnose(
    mismatches: &[Mismatch],
    after: &PostRecord,
    tx: &UpdateTransaction,
    latest_revision: Option<&RevisionRecord>,
) -> Diagnosis {
    let has = |pred: fn(&Mismatch) -> bool| mismatches.iter().any(pred);

    if has(|m| matches!(m, Mismatch::MetaMissing)) {
        Diagnosis::MetaNotExposed
    } else if has(|m| matches!(m, Mismatch::TimestampUnchanged { .. })) {
        Diagnosis::RevisionOnly
    } else if has(|m| matches!(m, Mismatch::TextNotFound { .. })) {
        let unchanged = match after.builder_data() {
            BuilderData::Present(raw) => tx.previous_builder_data.as_deref() == Some(raw),
            _ => false,
        };
        let native_has_text = tx
            .edits
            .first()
            .is_some_and(|edit| contains_marker(after.native_content.as_deref(), &edit.written));
        if unchanged || native_has_text {
            Diagnosis::MetaNotWritable
        } else {
            Diagnosis::ConcurrentEdit
        }
    } else if has(|m| matches!(m, Mismatch::ContentNotFound)) {
        let in_revision = tx.request.content().is_some_and(|written| {
            latest_revision.is_some_and(|revision| {
                revision.modified > tx.previous_modified
                    && contains_marker(revision.content.as_deref(), written)
            })
        });
        if in_revision {
            Diagnosis::RevisionOnly
        } else {
            Diagnosis::ConcurrentEdit
        }
    } else if has(|m| matches!(m, Mismatch::StatusUnchanged { .. })) {
        Diagnosis::StatusNotApplied
    } else {
        Diagnosis::RendererCacheStale
    }
}

/// Whether `haystack` (HTML) shows the plain-text marker of `written`.
/// A text without a usable marker is taken as shown.
fn contains_marker(haystack: Option<&str>, written: &str) -> bool {
    let Some(marker) = plain_marker(written) else {
        return true;
    };
    haystack.is_some_and(|html| plain_text(html).contains(&marker))
}

/// Longest run of letters, digits and spaces in the text of `html`,
/// truncated, or `None` if there is no usable run.
///
/// Punctuation is left out because WordPress rewrites quotes, dashes and
/// ampersands when rendering.
fn plain_marker(html: &str) -> Option<String> {
    let text = plain_text(html);
    let run = text
        .split(|c: char| !(c.is_alphanumeric() || c == ' '))
        .map(str::trim)
        .max_by_key(|run| run.chars().count())?;

    let marker: String = run.chars().take(MARKER_MAX_CHARS).collect();
    let marker = marker.trim_end();
    (marker.chars().count() >= MARKER_MIN_CHARS).then(|| marker.to_owned())
}

/// Text content of `html` with whitespace collapsed to single spaces.
pub(crate) fn plain_text(html: &str) -> String {
    TAG_RE
        .replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
