//! WordPress REST API types.

mod post;
mod site;

pub use post::{BuilderData, Context, PostRecord, PostStatus, UpdateRequest};
pub use site::{BUILDER_NAMESPACE, CORE_NAMESPACE, CurrentUser, RevisionRecord, SiteIndex};
