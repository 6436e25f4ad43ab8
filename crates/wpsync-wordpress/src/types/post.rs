//! WordPress post types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use wpsync_config::PublishMode;
use wpsync_elementor::{BUILDER_EDIT_MODE, DATA_META_KEY, EDIT_MODE_META_KEY};

/// Publication status of a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    /// Visible to editors only.
    Draft,
    /// Live on the public site.
    Publish,
    /// Any other status (`pending`, `private`, `future`, ...).
    Other(String),
}

impl PostStatus {
    /// REST API spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PostStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => Self::Draft,
            "publish" => Self::Publish,
            _ => Self::Other(s),
        }
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl From<PublishMode> for PostStatus {
    fn from(mode: PublishMode) -> Self {
        match mode {
            PublishMode::Draft => Self::Draft,
            PublishMode::Publish => Self::Publish,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Raw field values and protected meta; requires edit capability.
    Edit,
    /// What the public site sees.
    View,
}

impl Context {
    /// Query parameter value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::View => "view",
        }
    }
}

/// A post row as returned by `/wp/v2/{type}/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPost")]
pub struct PostRecord {
    /// Post id.
    pub id: u64,
    /// Publication status.
    pub status: PostStatus,
    /// Raw native content (edit context only). Search/SEO fallback; not
    /// what the page builder renders.
    pub native_content: Option<String>,
    /// Rendered HTML of the post body.
    pub rendered_content: Option<String>,
    /// Last modification time, GMT when the server provides it.
    pub modified: String,
    /// Public URL.
    pub link: Option<String>,
    /// REST-visible meta fields.
    pub meta: Map<String, Value>,
}

/// State of the page-builder document in a fetched post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderData<'a> {
    /// The meta key is missing: the site does not expose it over REST.
    NotExposed,
    /// Exposed but empty: a plain post without a builder document.
    Absent,
    /// The encoded document.
    Present(&'a str),
}

impl PostRecord {
    /// The `_elementor_data` meta value.
    ///
    /// A value of another type than string means the key is registered with
    /// the wrong schema; since it can be neither read nor written as a
    /// document it counts as not exposed.
    #[must_use]
    pub fn builder_data(&self) -> BuilderData<'_> {
        match self.meta.get(DATA_META_KEY) {
            None => BuilderData::NotExposed,
            Some(Value::String(raw)) if raw.is_empty() => BuilderData::Absent,
            Some(Value::String(raw)) => BuilderData::Present(raw),
            Some(Value::Null) => BuilderData::Absent,
            Some(_) => BuilderData::NotExposed,
        }
    }

    /// The `_elementor_edit_mode` meta value.
    #[must_use]
    pub fn edit_mode(&self) -> Option<&str> {
        self.meta.get(EDIT_MODE_META_KEY).and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
struct RawPost {
    id: u64,
    status: PostStatus,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    modified_gmt: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default, deserialize_with = "deserialize_meta")]
    meta: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    rendered: Option<String>,
}

impl From<RawPost> for PostRecord {
    fn from(raw: RawPost) -> Self {
        let (native_content, rendered_content) = raw
            .content
            .map_or((None, None), |content| (content.raw, content.rendered));
        Self {
            id: raw.id,
            status: raw.status,
            native_content,
            rendered_content,
            modified: raw.modified_gmt.or(raw.modified).unwrap_or_default(),
            link: raw.link,
            meta: raw.meta,
        }
    }
}

/// WordPress sends an empty meta mapping as `[]`.
fn deserialize_meta<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Array(items) if items.is_empty() => Ok(Map::new()),
        Value::Null => Ok(Map::new()),
        other => Err(serde::de::Error::custom(format!(
            "meta must be an object, got {other}"
        ))),
    }
}

/// Body of a post update.
///
/// A status is required to build one: WordPress stores an update without an
/// explicit status as an inert revision instead of changing the live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<BuilderMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct BuilderMeta {
    #[serde(rename = "_elementor_data")]
    data: String,
    #[serde(rename = "_elementor_edit_mode")]
    edit_mode: &'static str,
}

impl UpdateRequest {
    /// Start a request that sets `status`.
    #[must_use]
    pub fn new(status: PostStatus) -> Self {
        Self {
            status,
            content: None,
            meta: None,
        }
    }

    /// Also write the native content field.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Also write the encoded builder document, keeping builder rendering on.
    #[must_use]
    pub fn with_builder_data(mut self, encoded: impl Into<String>) -> Self {
        self.meta = Some(BuilderMeta {
            data: encoded.into(),
            edit_mode: BUILDER_EDIT_MODE,
        });
        self
    }

    /// Target status.
    #[must_use]
    pub fn status(&self) -> &PostStatus {
        &self.status
    }

    /// Native content to write.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Encoded builder document to write.
    #[must_use]
    pub fn builder_data(&self) -> Option<&str> {
        self.meta.as_ref().map(|meta| meta.data.as_str())
    }
}
