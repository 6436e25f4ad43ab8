//! Posts API abstraction.

use crate::error::WordPressError;
use crate::types::{Context, CurrentUser, PostRecord, RevisionRecord, SiteIndex, UpdateRequest};

/// Operations the synchronization workflow needs from a WordPress site.
///
/// [`WordPressClient`](crate::WordPressClient) talks to a real site;
/// `MockPosts` (behind the `mock` feature) keeps posts in memory.
pub trait PostsApi: Send + Sync {
    /// Fetch a post.
    ///
    /// # Errors
    ///
    /// Returns [`WordPressError::NotFound`] for an unknown id,
    /// [`WordPressError::Authorization`] for rejected credentials and
    /// [`WordPressError::Transport`] when the site is unreachable.
    fn fetch_post(&self, id: u64, context: Context) -> Result<PostRecord, WordPressError>;

    /// Write an update to the post's live row.
    ///
    /// # Errors
    ///
    /// As [`fetch_post`](Self::fetch_post), plus
    /// [`WordPressError::Conflict`] when the post was changed concurrently.
    fn update_post(&self, id: u64, request: &UpdateRequest) -> Result<PostRecord, WordPressError>;

    /// List the stored revisions of a post, newest first.
    ///
    /// # Errors
    ///
    /// As [`fetch_post`](Self::fetch_post).
    fn revisions(&self, id: u64) -> Result<Vec<RevisionRecord>, WordPressError>;

    /// Send an empty `POST` to a cache flush endpoint.
    ///
    /// Credentials are only sent when the URL is on the site's own origin.
    ///
    /// # Errors
    ///
    /// Returns [`WordPressError`] if the request fails.
    fn trigger(&self, url: &str) -> Result<(), WordPressError>;
}

/// Site-level checks run before any post is touched.
pub trait SiteApi: Send + Sync {
    /// Fetch the REST discovery index (`/wp-json/`).
    ///
    /// # Errors
    ///
    /// Returns [`WordPressError`] if the index cannot be fetched or parsed.
    fn discover(&self) -> Result<SiteIndex, WordPressError>;

    /// Fetch the user the credentials authenticate as.
    ///
    /// # Errors
    ///
    /// Returns [`WordPressError::Authorization`] when the credentials are
    /// rejected.
    fn current_user(&self) -> Result<CurrentUser, WordPressError>;
}
