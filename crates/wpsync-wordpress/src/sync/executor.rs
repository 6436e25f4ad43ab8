//! Post synchronizer implementation.

use tracing::{info, warn};
use wpsync_elementor::{
    Document, EditableField, MutateOptions, Selection, locate, mutate, widget_filter,
};

use crate::api::PostsApi;
use crate::cache;
use crate::types::{BuilderData, Context, PostRecord, PostStatus, RevisionRecord, UpdateRequest};
use crate::verify::{self, plain_text};

use super::error::SyncError;
use super::result::{DocumentState, DryRunResult, FieldPreview, InspectReport, SyncOutcome, SyncReport};
use super::{SyncOptions, UpdateTransaction};

/// Characters of current text shown by [`PostSynchronizer::inspect`].
const PREVIEW_CHARS: usize = 60;

/// Replaces widget text of builder-managed posts.
pub struct PostSynchronizer<'a> {
    api: &'a dyn PostsApi,
    options: SyncOptions,
}

impl<'a> PostSynchronizer<'a> {
    /// Create a new synchronizer.
    #[must_use]
    pub fn new(api: &'a dyn PostsApi, options: SyncOptions) -> Self {
        Self { api, options }
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Replace the text of the selected widgets of a post and verify the write.
    ///
    /// This method:
    /// 1. Fetches the post in edit context
    /// 2. Fails fast if the builder meta fields are not exposed
    /// 3. Decodes the document and replaces the selected fields' text
    /// 4. Writes document, edit mode, status and (optionally) native content
    /// 5. Fetches the post again and verifies the live row changed
    /// 6. Runs the configured cache flush
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A REST call fails ([`SyncError::WordPress`])
    /// - The meta fields are not exposed ([`SyncError::MetaNotExposed`])
    /// - The stored document cannot be decoded ([`SyncError::MalformedDocument`])
    /// - A `NodeId` selection names no eligible widget ([`SyncError::NodeNotEligible`])
    /// - The read-back disagrees with the write ([`SyncError::VerificationMismatch`])
    pub fn sync(&self, post_id: u64, text: &str) -> Result<SyncOutcome, SyncError> {
        let current = self.api.fetch_post(post_id, Context::Edit)?;

        let Some(tx) = self.prepare(&current, text)? else {
            info!(post_id, "No eligible fields, nothing written");
            return Ok(SyncOutcome::NoEligibleFields);
        };

        self.commit(tx)
    }

    /// Perform everything up to the write (no changes made).
    ///
    /// # Errors
    ///
    /// As [`sync`](Self::sync), except that verification errors cannot occur.
    pub fn dry_run(&self, post_id: u64, text: &str) -> Result<DryRunResult, SyncError> {
        let current = self.api.fetch_post(post_id, Context::Edit)?;
        let target_status = PostStatus::from(self.options.mode);

        let result = match self.prepare(&current, text)? {
            Some(tx) => DryRunResult {
                post_id,
                current_status: current.status,
                target_status,
                native_only: tx.is_native_only(),
                native_content: tx.request.content().is_some(),
                encoded_len: tx.request.builder_data().map(str::len),
                edits: tx.edits,
            },
            None => DryRunResult {
                post_id,
                current_status: current.status,
                target_status,
                edits: Vec::new(),
                native_only: false,
                native_content: false,
                encoded_len: None,
            },
        };
        Ok(result)
    }

    /// Read-only diagnostics of a post, including its stored revisions when
    /// the site lists them.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WordPress`] if the fetch fails and
    /// [`SyncError::MalformedDocument`] if the stored document cannot be decoded.
    pub fn inspect(&self, post_id: u64) -> Result<InspectReport, SyncError> {
        let post = self.api.fetch_post(post_id, Context::Edit)?;

        let document = match post.builder_data() {
            BuilderData::NotExposed => DocumentState::NotExposed,
            BuilderData::Absent => DocumentState::Absent,
            BuilderData::Present(raw) => {
                let doc = decode(post_id, raw)?;
                let selected = self.select(&doc);
                let fields = locate(&doc, |_| true)
                    .into_iter()
                    .map(|field| {
                        let text = doc
                            .node_at(&field.path)
                            .and_then(|node| node.settings.text(field.key))
                            .unwrap_or_default();
                        FieldPreview {
                            selected: selected.contains(&field),
                            preview: plain_text(text).chars().take(PREVIEW_CHARS).collect(),
                            node_id: field.node_id,
                            kind: field.kind,
                            key: field.key,
                        }
                    })
                    .collect();
                DocumentState::Present {
                    sections: doc.sections().len(),
                    nodes: doc.nodes().count(),
                    post_content_widget: doc.has_post_content_widget(),
                    fields,
                }
            }
        };

        let (revision_count, latest_revision) = match self.api.revisions(post_id) {
            Ok(revisions) => (Some(revisions.len()), revisions.into_iter().next()),
            Err(err) => {
                warn!(post_id, error = %err, "Revisions not available");
                (None, None)
            }
        };

        Ok(InspectReport {
            post_id,
            revision_count,
            latest_revision,
            edit_mode: post.edit_mode().map(str::to_owned),
            status: post.status,
            modified: post.modified,
            link: post.link,
            document,
        })
    }

    /// Build the transaction for `current`, or `None` if no field is eligible.
    fn prepare(
        &self,
        current: &PostRecord,
        text: &str,
    ) -> Result<Option<UpdateTransaction>, SyncError> {
        let post_id = current.id;
        let request = UpdateRequest::new(PostStatus::from(self.options.mode));

        let raw = match current.builder_data() {
            BuilderData::NotExposed => return Err(SyncError::MetaNotExposed { post_id }),
            BuilderData::Absent => {
                info!(post_id, "Post has no builder document, writing native content");
                return Ok(Some(UpdateTransaction {
                    post_id,
                    edits: Vec::new(),
                    request: request.with_content(text),
                    previous_modified: current.modified.clone(),
                    previous_builder_data: None,
                }));
            }
            BuilderData::Present(raw) => raw,
        };

        let mut doc = decode(post_id, raw)?;
        let fields = self.select(&doc);
        if fields.is_empty() {
            if let Selection::NodeId(node_id) = &self.options.selection {
                return Err(SyncError::NodeNotEligible {
                    post_id,
                    node_id: node_id.clone(),
                });
            }
            return Ok(None);
        }

        let options = MutateOptions {
            preserve_wrapper: self.options.preserve_wrapper,
        };
        let edits = fields
            .iter()
            .map(|field| mutate(&mut doc, field, text, options))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| SyncError::MalformedDocument { post_id, source })?;
        let encoded = doc
            .encode()
            .map_err(|source| SyncError::MalformedDocument { post_id, source })?;

        let mut request = request.with_builder_data(encoded);
        if self.options.update_native_content || doc.has_post_content_widget() {
            request = request.with_content(text);
        }

        info!(
            post_id,
            fields = edits.len(),
            changed = edits.iter().filter(|edit| edit.changed()).count(),
            "Prepared update"
        );

        Ok(Some(UpdateTransaction {
            post_id,
            edits,
            request,
            previous_modified: current.modified.clone(),
            previous_builder_data: Some(raw.to_owned()),
        }))
    }

    /// Write, verify and flush.
    fn commit(&self, tx: UpdateTransaction) -> Result<SyncOutcome, SyncError> {
        let post_id = tx.post_id;
        self.api.update_post(post_id, &tx.request)?;

        let after = self.api.fetch_post(post_id, Context::Edit)?;
        let mismatches = verify::check_write(&after, &tx);
        if !mismatches.is_empty() {
            let latest_revision = self.latest_revision(post_id);
            let diagnosis =
                verify::diagnose(&mismatches, &after, &tx, latest_revision.as_ref());
            warn!(post_id, %diagnosis, "Verification failed");
            return Err(SyncError::VerificationMismatch {
                post_id,
                mismatches,
                diagnosis,
                latest_revision,
            });
        }
        info!(post_id, status = %after.status, modified = %after.modified, "Update verified");

        let flushed =
            (!self.options.cache.is_empty()).then(|| cache::flush_all(&self.options.cache, self.api));

        if self.options.verify_rendered {
            let view = self.api.fetch_post(post_id, Context::View)?;
            if let Some(mismatch) = verify::check_rendered(&view, &tx) {
                let mismatches = vec![mismatch];
                let diagnosis = verify::diagnose(&mismatches, &after, &tx, None);
                warn!(post_id, %diagnosis, "Rendered page is stale");
                return Err(SyncError::VerificationMismatch {
                    post_id,
                    mismatches,
                    diagnosis,
                    latest_revision: None,
                });
            }
        }

        let native_only = tx.is_native_only();
        let report = SyncReport {
            post_id,
            status: after.status,
            modified: after.modified,
            link: after.link,
            native_content_updated: tx.request.content().is_some(),
            edits: tx.edits,
            flushed,
        };
        Ok(if native_only {
            SyncOutcome::NativeContentOnly(report)
        } else {
            SyncOutcome::Updated(report)
        })
    }

    /// Newest stored revision, best effort.
    fn latest_revision(&self, post_id: u64) -> Option<RevisionRecord> {
        match self.api.revisions(post_id) {
            Ok(revisions) => revisions.into_iter().next(),
            Err(err) => {
                warn!(post_id, error = %err, "Could not list revisions");
                None
            }
        }
    }

    /// Eligible fields of `doc` under the configured widgets and selection.
    fn select(&self, doc: &Document) -> Vec<EditableField> {
        let found = locate(doc, widget_filter(&self.options.widgets));
        self.options.selection.apply(doc, found)
    }
}

fn decode(post_id: u64, raw: &str) -> Result<Document, SyncError> {
    Document::decode(raw).map_err(|source| SyncError::MalformedDocument { post_id, source })
}
