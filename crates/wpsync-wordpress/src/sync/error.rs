//! Error types for synchronization.

use wpsync_elementor::DocumentError;

use crate::error::WordPressError;
use crate::types::RevisionRecord;
use crate::verify::{Diagnosis, Mismatch};

/// Error during a synchronization cycle.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// REST API error.
    #[error(transparent)]
    WordPress(#[from] WordPressError),

    /// The stored builder document cannot be decoded.
    #[error("post {post_id}: malformed page-builder document: {source}")]
    MalformedDocument {
        /// Post id.
        post_id: u64,
        /// Decode error.
        #[source]
        source: DocumentError,
    },

    /// The site does not expose the builder meta fields over REST.
    #[error("post {post_id}: page-builder meta fields are not exposed by the REST API")]
    MetaNotExposed {
        /// Post id.
        post_id: u64,
    },

    /// A `NodeId` selection names a widget that is missing or not eligible.
    #[error("post {post_id}: no eligible widget with id {node_id}")]
    NodeNotEligible {
        /// Post id.
        post_id: u64,
        /// Requested element id.
        node_id: String,
    },

    /// The same post appears more than once in a batch.
    #[error("post {post_id}: listed more than once in the batch")]
    DuplicatePost {
        /// Post id.
        post_id: u64,
    },

    /// The write was accepted, but the read-back disagrees.
    #[error("post {post_id}: verification failed ({diagnosis}): {}", join(.mismatches))]
    VerificationMismatch {
        /// Post id.
        post_id: u64,
        /// Failed checks.
        mismatches: Vec<Mismatch>,
        /// Most likely cause.
        diagnosis: Diagnosis,
        /// Newest stored revision at the time of the read-back.
        latest_revision: Option<RevisionRecord>,
    },
}

impl SyncError {
    /// What the operator should check.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::WordPress(err) => err.guidance(),
            Self::MalformedDocument { .. } => {
                "Open the post in the Elementor editor and save it once to rewrite its data."
            }
            Self::MetaNotExposed { .. } => Diagnosis::MetaNotExposed.guidance(),
            Self::NodeNotEligible { .. } => {
                "Run `wpsync inspect` to list the element ids of eligible widgets."
            }
            Self::DuplicatePost { .. } => "List each post once; merge the texts first.",
            Self::VerificationMismatch { diagnosis, .. } => diagnosis.guidance(),
        }
    }
}

fn join(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
