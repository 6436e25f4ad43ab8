//! Parallel synchronization of several posts.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{info, warn};

use super::error::SyncError;
use super::executor::PostSynchronizer;
use super::result::SyncOutcome;

/// One post and its new text.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Post id.
    pub post_id: u64,
    /// New text.
    pub text: String,
}

/// Outcome of one job.
#[derive(Debug)]
pub struct BatchResult {
    /// Post id.
    pub post_id: u64,
    /// Cycle result.
    pub result: Result<SyncOutcome, SyncError>,
}

impl PostSynchronizer<'_> {
    /// Synchronize posts in parallel.
    ///
    /// Uses the global rayon thread pool. Each post runs its own pipeline;
    /// a failure affects only that post. Results keep the order of `jobs`.
    ///
    /// A post listed more than once fails with [`SyncError::DuplicatePost`]
    /// for every occurrence and is not touched.
    #[must_use]
    pub fn sync_batch(&self, jobs: &[BatchJob]) -> Vec<BatchResult> {
        info!(posts = jobs.len(), "Synchronizing batch");

        let mut occurrences: HashMap<u64, usize> = HashMap::new();
        for job in jobs {
            *occurrences.entry(job.post_id).or_default() += 1;
        }

        jobs.par_iter()
            .map(|job| {
                let post_id = job.post_id;
                let result = if occurrences[&post_id] > 1 {
                    warn!(post_id, "Post listed more than once, skipped");
                    Err(SyncError::DuplicatePost { post_id })
                } else {
                    self.sync(post_id, &job.text)
                };
                BatchResult { post_id, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::error::WordPressError;
    use crate::mock::MockPosts;
    use crate::sync::SyncOptions;
    use crate::sync::executor::tests::DOCUMENT;
    use crate::types::PostStatus;

    #[test]
    fn test_batch_isolates_failures() {
        let api = MockPosts::new()
            .with_post(MockPosts::elementor_post(42, PostStatus::Publish, DOCUMENT))
            .with_post(MockPosts::elementor_post(43, PostStatus::Publish, "[{\"id\":"));
        let synchronizer = PostSynchronizer::new(&api, SyncOptions::default());

        let jobs: Vec<BatchJob> = [42, 43, 44]
            .into_iter()
            .map(|post_id| BatchJob {
                post_id,
                text: "<p>New text</p>".to_owned(),
            })
            .collect();
        let results = synchronizer.sync_batch(&jobs);

        let ids: Vec<u64> = results.iter().map(|r| r.post_id).collect();
        assert_eq!(ids, vec![42, 43, 44]);
        assert!(matches!(results[0].result, Ok(SyncOutcome::Updated(_))));
        assert!(matches!(
            results[1].result,
            Err(SyncError::MalformedDocument { post_id: 43, .. })
        ));
        assert!(matches!(
            results[2].result,
            Err(SyncError::WordPress(WordPressError::NotFound { .. }))
        ));
        assert_eq!(api.updates().len(), 1);
    }

    #[test]
    fn test_batch_rejects_repeated_post() {
        let api = MockPosts::new()
            .with_post(MockPosts::elementor_post(42, PostStatus::Publish, DOCUMENT))
            .with_post(MockPosts::elementor_post(43, PostStatus::Publish, DOCUMENT));
        let synchronizer = PostSynchronizer::new(&api, SyncOptions::default());

        let jobs = vec![
            BatchJob {
                post_id: 42,
                text: "<p>Alpha version of the text</p>".to_owned(),
            },
            BatchJob {
                post_id: 43,
                text: "<p>Only text for this post</p>".to_owned(),
            },
            BatchJob {
                post_id: 42,
                text: "<p>Bravo version of the text</p>".to_owned(),
            },
        ];
        let results = synchronizer.sync_batch(&jobs);

        assert!(matches!(
            results[0].result,
            Err(SyncError::DuplicatePost { post_id: 42 })
        ));
        assert!(matches!(results[1].result, Ok(SyncOutcome::Updated(_))));
        assert!(matches!(
            results[2].result,
            Err(SyncError::DuplicatePost { post_id: 42 })
        ));
        let written: Vec<u64> = api.updates().iter().map(|(id, _)| *id).collect();
        assert_eq!(written, vec![43]);
    }
}
