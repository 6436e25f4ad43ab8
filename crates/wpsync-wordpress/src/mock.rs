//! In-memory posts API for testing.
//!
//! Provides [`MockPosts`], which simulates the server-side behaviors the
//! synchronization workflow has to cope with.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde_json::{Map, Value};
use wpsync_elementor::{DATA_META_KEY, Document, EDIT_MODE_META_KEY};

use crate::api::{PostsApi, SiteApi};
use crate::error::WordPressError;
use crate::types::{
    BUILDER_NAMESPACE, BuilderData, CORE_NAMESPACE, Context, CurrentUser, PostRecord, PostStatus,
    RevisionRecord, SiteIndex, UpdateRequest,
};

/// Modification time of posts created by the helper constructors.
pub const INITIAL_MODIFIED: &str = "2024-05-01T10:00:00";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum WriteMode {
    #[default]
    Live,
    /// Accept updates but leave the live row untouched.
    RevisionOnly,
    /// Apply status and content, silently drop meta.
    DropMeta,
}

#[derive(Debug, Default)]
struct Behavior {
    write: WriteMode,
    reject_credentials: bool,
    conflict: bool,
    transport_failures: usize,
    stale_render: bool,
    missing_namespaces: Vec<String>,
    read_only_user: bool,
}

/// Mock posts API for testing.
///
/// # Example
///
/// ```ignore
/// use wpsync_wordpress::{Context, MockPosts, PostStatus, PostsApi};
///
/// let api = MockPosts::new()
///     .with_post(MockPosts::elementor_post(42, PostStatus::Publish, "[]"))
///     .revision_only();
/// let post = api.fetch_post(42, Context::Edit).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockPosts {
    posts: Mutex<HashMap<u64, PostRecord>>,
    behavior: Mutex<Behavior>,
    updates: Mutex<Vec<(u64, UpdateRequest)>>,
    revisions: Mutex<Vec<RevisionRecord>>,
    triggered: Mutex<Vec<String>>,
    fetches: AtomicUsize,
    clock: AtomicU64,
}

impl MockPosts {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A post carrying a builder document, with both meta fields exposed.
    #[must_use]
    pub fn elementor_post(id: u64, status: PostStatus, raw: &str) -> PostRecord {
        let mut meta = Map::new();
        meta.insert(DATA_META_KEY.to_owned(), Value::String(raw.to_owned()));
        meta.insert(EDIT_MODE_META_KEY.to_owned(), Value::String("builder".to_owned()));
        let mut post = Self::base_post(id, status, meta);
        post.rendered_content = render(&post);
        post
    }

    /// A plain post: meta exposed, no builder document.
    #[must_use]
    pub fn plain_post(id: u64, status: PostStatus, content: &str) -> PostRecord {
        let mut meta = Map::new();
        meta.insert(DATA_META_KEY.to_owned(), Value::String(String::new()));
        let mut post = Self::base_post(id, status, meta);
        post.native_content = Some(content.to_owned());
        post.rendered_content = Some(content.to_owned());
        post
    }

    /// A post on a site that does not register the builder meta for REST.
    #[must_use]
    pub fn stripped_post(id: u64, status: PostStatus) -> PostRecord {
        Self::base_post(id, status, Map::new())
    }

    fn base_post(id: u64, status: PostStatus, meta: Map<String, Value>) -> PostRecord {
        PostRecord {
            id,
            status,
            native_content: Some(String::new()),
            rendered_content: None,
            modified: INITIAL_MODIFIED.to_owned(),
            link: Some(format!("https://blog.example.com/?p={id}")),
            meta,
        }
    }

    /// Add a post.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_post(self, post: PostRecord) -> Self {
        self.posts.lock().unwrap().insert(post.id, post);
        self
    }

    /// Accept updates without touching the live row.
    #[must_use]
    pub fn revision_only(self) -> Self {
        self.set(|b| b.write = WriteMode::RevisionOnly)
    }

    /// Drop meta fields from writes while applying everything else.
    #[must_use]
    pub fn drop_meta_writes(self) -> Self {
        self.set(|b| b.write = WriteMode::DropMeta)
    }

    /// Reject every request with HTTP 401.
    #[must_use]
    pub fn reject_credentials(self) -> Self {
        self.set(|b| b.reject_credentials = true)
    }

    /// Answer updates with HTTP 409.
    #[must_use]
    pub fn conflict_on_update(self) -> Self {
        self.set(|b| b.conflict = true)
    }

    /// Fail the next `count` requests with a transport error.
    #[must_use]
    pub fn failing_transport(self, count: usize) -> Self {
        self.set(|b| b.transport_failures = count)
    }

    /// Keep serving the old rendering after updates.
    #[must_use]
    pub fn stale_render(self) -> Self {
        self.set(|b| b.stale_render = true)
    }

    /// Leave a namespace out of the discovery index.
    #[must_use]
    pub fn without_namespace(self, namespace: &str) -> Self {
        self.set(|b| b.missing_namespaces.push(namespace.to_owned()))
    }

    /// Authenticate as a user without the `edit_posts` capability.
    #[must_use]
    pub fn read_only_user(self) -> Self {
        self.set(|b| b.read_only_user = true)
    }

    fn set(self, f: impl FnOnce(&mut Behavior)) -> Self {
        f(&mut self.behavior.lock().unwrap());
        self
    }

    /// Updates received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn updates(&self) -> Vec<(u64, UpdateRequest)> {
        self.updates.lock().unwrap().clone()
    }

    /// URLs passed to [`PostsApi::trigger`].
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn triggered(&self) -> Vec<String> {
        self.triggered.lock().unwrap().clone()
    }

    /// Number of fetches served.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Current state of a post.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn post(&self, id: u64) -> Option<PostRecord> {
        self.posts.lock().unwrap().get(&id).cloned()
    }

    /// Failure injected for the next request, if any.
    fn injected_failure(&self) -> Option<WordPressError> {
        self.transport_failure().or_else(|| self.credentials_failure())
    }

    fn transport_failure(&self) -> Option<WordPressError> {
        let mut behavior = self.behavior.lock().unwrap();
        if behavior.transport_failures > 0 {
            behavior.transport_failures -= 1;
            return Some(WordPressError::Transport("connection timed out".to_owned()));
        }
        None
    }

    fn credentials_failure(&self) -> Option<WordPressError> {
        let behavior = self.behavior.lock().unwrap();
        behavior.reject_credentials.then(|| WordPressError::Authorization {
            status: 401,
            code: Some("rest_not_logged_in".to_owned()),
            message: "You are not currently logged in.".to_owned(),
        })
    }

    fn next_modified(&self) -> String {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        format!("2024-05-01T11:{:02}:{:02}", (tick / 60) % 60, tick % 60)
    }

    fn not_found() -> WordPressError {
        WordPressError::NotFound {
            message: "Invalid post ID.".to_owned(),
        }
    }
}

impl PostsApi for MockPosts {
    fn fetch_post(&self, id: u64, context: Context) -> Result<PostRecord, WordPressError> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let mut post = self.post(id).ok_or_else(Self::not_found)?;
        if context == Context::View {
            post.native_content = None;
        }
        Ok(post)
    }

    fn update_post(&self, id: u64, request: &UpdateRequest) -> Result<PostRecord, WordPressError> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let (write, conflict, stale_render) = {
            let behavior = self.behavior.lock().unwrap();
            (behavior.write, behavior.conflict, behavior.stale_render)
        };
        if conflict {
            return Err(WordPressError::Conflict {
                message: "The post has been modified since it was loaded.".to_owned(),
            });
        }

        self.updates.lock().unwrap().push((id, request.clone()));

        let mut posts = self.posts.lock().unwrap();
        let post = posts.get_mut(&id).ok_or_else(Self::not_found)?;

        let stamp = self.next_modified();
        let mut revisions = self.revisions.lock().unwrap();
        let revision_id = 900 + revisions.len() as u64;
        revisions.push(RevisionRecord {
            id: revision_id,
            parent: id,
            modified: stamp.clone(),
            content: request
                .content()
                .map(str::to_owned)
                .or_else(|| post.native_content.clone()),
        });
        drop(revisions);

        if write == WriteMode::RevisionOnly {
            return Ok(post.clone());
        }

        post.status = request.status().clone();
        if let Some(content) = request.content() {
            post.native_content = Some(content.to_owned());
        }
        if write == WriteMode::Live
            && let Some(raw) = request.builder_data()
        {
            post.meta
                .insert(DATA_META_KEY.to_owned(), Value::String(raw.to_owned()));
            post.meta
                .insert(EDIT_MODE_META_KEY.to_owned(), Value::String("builder".to_owned()));
        }
        post.modified = stamp;
        if !stale_render {
            post.rendered_content = render(post);
        }
        Ok(post.clone())
    }

    fn revisions(&self, id: u64) -> Result<Vec<RevisionRecord>, WordPressError> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        if self.post(id).is_none() {
            return Err(Self::not_found());
        }
        Ok(self
            .revisions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|revision| revision.parent == id)
            .cloned()
            .collect())
    }

    fn trigger(&self, url: &str) -> Result<(), WordPressError> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        self.triggered.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

impl SiteApi for MockPosts {
    fn discover(&self) -> Result<SiteIndex, WordPressError> {
        if let Some(err) = self.transport_failure() {
            return Err(err);
        }
        let behavior = self.behavior.lock().unwrap();
        Ok(SiteIndex {
            name: Some("Mock Site".to_owned()),
            namespaces: ["oembed/1.0", CORE_NAMESPACE, BUILDER_NAMESPACE]
                .into_iter()
                .filter(|ns| !behavior.missing_namespaces.iter().any(|m| m == ns))
                .map(str::to_owned)
                .collect(),
        })
    }

    fn current_user(&self) -> Result<CurrentUser, WordPressError> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let edit_posts = !self.behavior.lock().unwrap().read_only_user;
        let mut capabilities = Map::new();
        capabilities.insert("read".to_owned(), Value::Bool(true));
        capabilities.insert("edit_posts".to_owned(), Value::Bool(edit_posts));
        Ok(CurrentUser {
            id: 1,
            name: "editor".to_owned(),
            capabilities,
        })
    }
}

/// What the builder would render: the editable texts of the document, or the
/// native content of a plain post.
fn render(post: &PostRecord) -> Option<String> {
    match post.builder_data() {
        BuilderData::Present(raw) => {
            let doc = Document::decode(raw).ok()?;
            let texts: Vec<&str> = doc.nodes().filter_map(|node| node.editable_text()).collect();
            Some(texts.join("\n"))
        }
        _ => post.native_content.clone(),
    }
}
