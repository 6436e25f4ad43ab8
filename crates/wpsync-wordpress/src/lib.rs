//! WordPress REST client and synchronization workflow for wpsync.
//!
//! This crate writes new text into Elementor-managed posts and verifies that
//! the write actually reached the live post row. It provides:
//!
//! - [`PostsApi`] trait with `fetch_post()`, `update_post()`, `revisions()`
//!   and `trigger()`
//! - [`SiteApi`] trait and [`check_site`] for REST discovery and credentials
//! - [`WordPressClient`] implementation over the REST API with Basic auth
//!   (application passwords)
//! - [`PostSynchronizer`] for the fetch, mutate, write, verify and flush cycle
//! - [`MockPosts`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use wpsync_wordpress::{Context, PostsApi, WordPressClient};
//!
//! let client = WordPressClient::from_config(config.require_wordpress()?);
//! let post = client.fetch_post(42, Context::Edit)?;
//! println!("{} last modified {}", post.id, post.modified);
//! ```

mod api;
mod auth;
pub mod cache;
mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod site;
pub mod sync;
mod types;
pub mod verify;

pub use api::{PostsApi, SiteApi};
pub use cache::CacheFlush;
pub use client::WordPressClient;
pub use error::WordPressError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{INITIAL_MODIFIED, MockPosts};
pub use site::{SiteProblem, SiteReport, check_site};
pub use sync::{
    BatchJob, BatchResult, DocumentState, DryRunResult, FieldPreview, InspectReport,
    PostSynchronizer, SyncError, SyncOptions, SyncOutcome, SyncReport, UpdateTransaction,
};
pub use types::{
    BUILDER_NAMESPACE, BuilderData, CORE_NAMESPACE, Context, CurrentUser, PostRecord, PostStatus,
    RevisionRecord, SiteIndex, UpdateRequest,
};
pub use verify::{Diagnosis, Mismatch, REGISTER_META_SNIPPET};
