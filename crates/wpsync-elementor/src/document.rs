//! Page-builder document: an ordered forest of element nodes.

use std::collections::HashSet;

use crate::codec::{self, EncodingStyle};
use crate::error::DocumentError;
use crate::node::Node;
use crate::widget::WidgetKind;

/// Decoded `_elementor_data` value.
///
/// The document owns its node tree. Decoding and then encoding an untouched
/// compact document reproduces the original string exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    style: EncodingStyle,
}

impl Document {
    /// Create a document from top-level nodes, encoded in PHP style.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            style: EncodingStyle::PHP,
        }
    }

    /// Parse the raw meta value.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the string is not JSON, the root is not an
    /// array, an element lacks `id`/`elType` or has malformed
    /// `settings`/`elements`, or two elements share an id.
    pub fn decode(raw: &str) -> Result<Self, DocumentError> {
        let (nodes, style) = codec::decode(raw)?;
        let doc = Self { nodes, style };
        doc.check_unique_ids()?;
        Ok(doc)
    }

    /// Serialize back into the meta value, in the style the document was read in.
    ///
    /// Deterministic: the same document always yields the same bytes.
    pub fn encode(&self) -> Result<String, DocumentError> {
        codec::encode(&self.nodes, self.style)
    }

    /// Escaping conventions used by [`encode`](Self::encode).
    #[must_use]
    pub fn style(&self) -> EncodingStyle {
        self.style
    }

    /// Top-level elements (usually sections or containers).
    #[must_use]
    pub fn sections(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, parent before children, children in order.
    #[must_use]
    pub fn nodes(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.nodes.iter()],
        }
    }

    /// First node with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.nodes().find(|node| node.id == id)
    }

    /// Text stored under `key` in the settings of node `id`.
    #[must_use]
    pub fn text_of(&self, id: &str, key: &str) -> Option<&str> {
        self.find(id)?.settings.text(key)
    }

    /// Node at a child-index path.
    #[must_use]
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.nodes.get(*first)?, |node, &index| node.children.get(index))
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for &index in rest {
            node = node.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Whether a widget renders the post's native content.
    ///
    /// When it does, the native content is visible on the page and has to be
    /// kept in step with the builder text.
    #[must_use]
    pub fn has_post_content_widget(&self) -> bool {
        self.nodes()
            .any(|node| node.widget == Some(WidgetKind::PostContent))
    }

    /// Lookups by id are only meaningful when ids are unique.
    fn check_unique_ids(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for node in self.nodes() {
            if !seen.insert(node.id.as_str()) {
                return Err(DocumentError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }
}

/// Pre-order iterator over a document's nodes.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            if let Some(node) = top.next() {
                self.stack.push(node.children.iter());
                return Some(node);
            }
            self.stack.pop();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::widget::ElementType;
    use pretty_assertions::assert_eq;

    /// Section > column > heading, rich text, image; as stored by Elementor.
    pub(crate) const PHP_DOCUMENT: &str = r##"[{"id":"1a2b3c4d","elType":"section","settings":{"layout":"full_width","background_color":"#ffffff","gap":"no"},"elements":[{"id":"2b3c4d5e","elType":"column","settings":{"_column_size":100,"_inline_size":33.30},"elements":[{"id":"3c4d5e6f","elType":"widget","settings":{"title":"Caf\u00e9 Playlist \ud83c\udfb5","header_size":"h2"},"elements":[],"widgetType":"heading"},{"id":"4d5e6f70","elType":"widget","settings":{"editor":"<p>Old text<\/p>","text_color":"#333","_margin":{"unit":"px","top":"0","right":"0","bottom":"20","left":"0","isLinked":false}},"elements":[],"widgetType":"text-editor"},{"id":"5e6f7081","elType":"widget","settings":{"image":{"url":"https:\/\/example.com\/wp-content\/uploads\/a.jpg","id":12,"alt":""},"image_size":"large","link_to":null},"elements":[],"widgetType":"image"}],"isInner":false}],"isInner":false},{"id":"6f708192","elType":"section","settings":[],"elements":[],"isInner":false}]"##;

    /// Container layout with literal slashes and UTF-8.
    const UNESCAPED_DOCUMENT: &str = r#"[{"id":"a1","elType":"container","settings":{"content_width":"full","flex_gap":{"size":1.0e1,"unit":"px"}},"elements":[{"id":"b2","elType":"widget","settings":{"editor":"<p>Café ☕ at https://example.com/</p>"},"elements":[],"widgetType":"text-editor"},{"id":"c3","elType":"widget","settings":{"text":"Listen now"},"elements":[],"widgetType":"text"}],"isInner":false}]"#;

    #[test]
    fn test_round_trip_php_document() {
        let doc = Document::decode(PHP_DOCUMENT).unwrap();
        assert_eq!(doc.style(), EncodingStyle::PHP);
        assert_eq!(doc.encode().unwrap(), PHP_DOCUMENT);
    }

    #[test]
    fn test_round_trip_unescaped_document() {
        let doc = Document::decode(UNESCAPED_DOCUMENT).unwrap();
        assert_eq!(doc.style(), EncodingStyle::UNESCAPED);
        assert_eq!(doc.encode().unwrap(), UNESCAPED_DOCUMENT);
    }

    #[test]
    fn test_encode_is_idempotent() {
        let once = Document::decode(PHP_DOCUMENT).unwrap().encode().unwrap();
        let twice = Document::decode(&once).unwrap().encode().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_round_trip_empty_document() {
        let doc = Document::decode("[]").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.encode().unwrap(), "[]");
    }

    #[test]
    fn test_pretty_input_encodes_compact() {
        let pretty = "[\n  {\"id\": \"a\", \"elType\": \"section\", \"elements\": []}\n]";
        let doc = Document::decode(pretty).unwrap();
        assert_eq!(
            doc.encode().unwrap(),
            r#"[{"id":"a","elType":"section","elements":[]}]"#
        );
    }

    #[test]
    fn test_decode_model() {
        let doc = Document::decode(PHP_DOCUMENT).unwrap();
        assert_eq!(doc.sections().len(), 2);

        let ids: Vec<_> = doc.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            ["1a2b3c4d", "2b3c4d5e", "3c4d5e6f", "4d5e6f70", "5e6f7081", "6f708192"]
        );

        let heading = doc.find("3c4d5e6f").unwrap();
        assert_eq!(heading.el_type, ElementType::Widget);
        assert_eq!(heading.widget, Some(WidgetKind::Heading));
        assert_eq!(heading.editable_text(), Some("Café Playlist 🎵"));

        assert_eq!(doc.text_of("4d5e6f70", "editor"), Some("<p>Old text</p>"));
        assert_eq!(doc.find("5e6f7081").unwrap().widget, Some(WidgetKind::parse("image")));
    }

    #[test]
    fn test_node_at_paths() {
        let doc = Document::decode(PHP_DOCUMENT).unwrap();
        assert_eq!(doc.node_at(&[0, 0, 1]).unwrap().id, "4d5e6f70");
        assert_eq!(doc.node_at(&[1]).unwrap().id, "6f708192");
        assert!(doc.node_at(&[0, 3]).is_none());
        assert!(doc.node_at(&[]).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_id() {
        let err = Document::decode(r#"[{"elType":"section","elements":[]}]"#).unwrap_err();
        assert_eq!(err.to_string(), "element at 0: missing id");
    }

    #[test]
    fn test_decode_rejects_duplicate_ids() {
        let raw = r#"[{"id":"s1","elType":"section","settings":[],"elements":[{"id":"t1","elType":"widget","settings":{"editor":"<p>A<\/p>"},"elements":[],"widgetType":"text-editor"},{"id":"t1","elType":"widget","settings":{"editor":"<p>B<\/p>"},"elements":[],"widgetType":"text-editor"}],"isInner":false}]"#;
        assert!(matches!(
            Document::decode(raw),
            Err(DocumentError::DuplicateId(id)) if id == "t1"
        ));
    }

    #[test]
    fn test_has_post_content_widget() {
        let doc = Document::decode(PHP_DOCUMENT).unwrap();
        assert!(!doc.has_post_content_widget());

        let doc = Document::new(vec![
            Node::new("s", ElementType::Section)
                .with_children(vec![Node::widget("p", WidgetKind::PostContent)]),
        ]);
        assert!(doc.has_post_content_widget());
    }

    #[test]
    fn test_new_document_encodes_php_style() {
        let doc = Document::new(vec![
            Node::widget("w", WidgetKind::RichText).with_text("editor", "<p>Olé</p>"),
        ]);
        assert_eq!(
            doc.encode().unwrap(),
            r#"[{"id":"w","elType":"widget","settings":{"editor":"<p>Ol\u00e9<\/p>"},"elements":[],"widgetType":"text-editor"}]"#
        );
    }
}
