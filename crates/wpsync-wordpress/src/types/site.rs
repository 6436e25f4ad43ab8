//! Site-level REST resources: discovery index, authenticated user, revisions.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Core REST namespace.
pub const CORE_NAMESPACE: &str = "wp/v2";

/// Namespace registered by the Elementor plugin.
pub const BUILDER_NAMESPACE: &str = "elementor/v1";

/// `GET /wp-json/` discovery document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteIndex {
    /// Site title.
    #[serde(default)]
    pub name: Option<String>,
    /// Registered REST namespaces, e.g. `wp/v2`.
    #[serde(default)]
    pub namespaces: Vec<String>,
}

impl SiteIndex {
    /// Whether the namespace is registered.
    #[must_use]
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|n| n == namespace)
    }
}

/// `GET /wp/v2/users/me?context=edit`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentUser {
    /// User id.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Capability flags (edit context only).
    #[serde(default, deserialize_with = "deserialize_capabilities")]
    pub capabilities: Map<String, Value>,
}

impl CurrentUser {
    /// Whether the user may edit posts; `None` if capabilities were not returned.
    #[must_use]
    pub fn can_edit_posts(&self) -> Option<bool> {
        if self.capabilities.is_empty() {
            return None;
        }
        Some(
            self.capabilities
                .get("edit_posts")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        )
    }
}

/// One stored revision of a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRevision")]
pub struct RevisionRecord {
    /// Revision id.
    pub id: u64,
    /// Post the revision belongs to.
    pub parent: u64,
    /// Creation time (GMT when available).
    pub modified: String,
    /// Native content captured by the revision.
    pub content: Option<String>,
}

#[derive(Deserialize)]
struct RawRevision {
    id: u64,
    #[serde(default)]
    parent: u64,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    modified_gmt: Option<String>,
    #[serde(default)]
    content: Option<RawRevisionContent>,
}

#[derive(Deserialize)]
struct RawRevisionContent {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    rendered: Option<String>,
}

impl From<RawRevision> for RevisionRecord {
    fn from(raw: RawRevision) -> Self {
        Self {
            id: raw.id,
            parent: raw.parent,
            modified: raw.modified_gmt.or(raw.modified).unwrap_or_default(),
            content: raw.content.and_then(|c| c.raw.or(c.rendered)),
        }
    }
}

/// Capabilities arrive as `{}` or, for users without any, as `[]`.
fn deserialize_capabilities<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_site_index_namespaces() {
        let index: SiteIndex = serde_json::from_str(
            r#"{"name":"Weekly Picks","url":"https://blog.example.com","namespaces":["oembed/1.0","wp/v2","elementor/v1"],"routes":{}}"#,
        )
        .unwrap();
        assert_eq!(index.name.as_deref(), Some("Weekly Picks"));
        assert!(index.has_namespace(CORE_NAMESPACE));
        assert!(index.has_namespace(BUILDER_NAMESPACE));
        assert!(!index.has_namespace("wc/v3"));
    }

    #[test]
    fn test_current_user_capabilities() {
        let user: CurrentUser = serde_json::from_str(
            r#"{"id":3,"name":"Editor","capabilities":{"edit_posts":true,"read":true}}"#,
        )
        .unwrap();
        assert_eq!(user.can_edit_posts(), Some(true));

        let user: CurrentUser =
            serde_json::from_str(r#"{"id":4,"name":"Reader","capabilities":{"read":true}}"#).unwrap();
        assert_eq!(user.can_edit_posts(), Some(false));

        let user: CurrentUser = serde_json::from_str(r#"{"id":5,"name":"View"}"#).unwrap();
        assert_eq!(user.can_edit_posts(), None);
    }

    #[test]
    fn test_revision_prefers_gmt_and_raw() {
        let revision: RevisionRecord = serde_json::from_str(
            r#"{"id":901,"parent":42,"modified":"2024-05-01T13:00:00","modified_gmt":"2024-05-01T11:00:00","content":{"raw":"<p>New text</p>","rendered":"<p>New text</p>\n"}}"#,
        )
        .unwrap();
        assert_eq!(
            revision,
            RevisionRecord {
                id: 901,
                parent: 42,
                modified: "2024-05-01T11:00:00".to_owned(),
                content: Some("<p>New text</p>".to_owned()),
            }
        );
    }
}
