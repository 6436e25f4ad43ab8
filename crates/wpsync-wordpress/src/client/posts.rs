//! Post operations for the WordPress REST API.

use tracing::info;

use super::WordPressClient;
use crate::api::PostsApi;
use crate::error::WordPressError;
use crate::types::{Context, PostRecord, RevisionRecord, UpdateRequest};

impl PostsApi for WordPressClient {
    fn fetch_post(&self, id: u64, context: Context) -> Result<PostRecord, WordPressError> {
        let url = format!("{}?context={}", self.post_url(id), context.as_str());

        info!(post_id = id, context = context.as_str(), "Fetching post");

        let body = self.get(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn update_post(&self, id: u64, request: &UpdateRequest) -> Result<PostRecord, WordPressError> {
        let url = self.post_url(id);
        let payload = serde_json::to_vec(request)?;

        info!(
            post_id = id,
            status = %request.status(),
            builder = request.builder_data().is_some(),
            content = request.content().is_some(),
            "Updating post"
        );

        let body = self.put_json(&url, &payload)?;
        let post: PostRecord = serde_json::from_str(&body)?;

        info!(post_id = id, status = %post.status, modified = %post.modified, "Updated post");
        Ok(post)
    }

    fn revisions(&self, id: u64) -> Result<Vec<RevisionRecord>, WordPressError> {
        let url = format!("{}/revisions?context=edit", self.post_url(id));

        info!(post_id = id, "Listing revisions");

        let body = self.get(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn trigger(&self, url: &str) -> Result<(), WordPressError> {
        info!(url, "Triggering endpoint");
        self.post_empty(url).map(|_| ())
    }
}
