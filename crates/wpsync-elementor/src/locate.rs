//! Finding editable text fields and replacing their text.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;
use crate::error::{DocumentError, format_path};
use crate::node::Node;
use crate::widget::WidgetKind;

/// A single outer `<div ...>...</div>` around rich text.
static DIV_WRAPPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(<div[^>]*>)(.*)(</div>)$").unwrap());

/// Address of an editable text setting.
///
/// Fields are addresses (a child-index path plus the settings key), not
/// borrows, so a list of them can be held while the document is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableField {
    /// Child-index path from the document root.
    pub path: Vec<usize>,
    /// Id of the widget node.
    pub node_id: String,
    /// Widget capability.
    pub kind: WidgetKind,
    /// Settings key holding the text.
    pub key: &'static str,
}

/// Record of one text replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    /// Id of the widget node.
    pub node_id: String,
    /// Settings key that was written.
    pub key: &'static str,
    /// Text before the edit, if the setting held a string.
    pub previous: Option<String>,
    /// Text now stored in the setting.
    pub written: String,
}

impl FieldEdit {
    /// Whether the edit changed the stored text.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous.as_deref() != Some(self.written.as_str())
    }
}

/// Options for [`mutate`].
#[derive(Debug, Clone, Copy)]
pub struct MutateOptions {
    /// Keep an existing outer `<div>` wrapper of rich text (it usually
    /// carries classes or inline styles set in the editor).
    pub preserve_wrapper: bool,
}

impl Default for MutateOptions {
    fn default() -> Self {
        Self {
            preserve_wrapper: true,
        }
    }
}

/// Predicate accepting widgets of the given kinds.
pub fn widget_filter(kinds: &[WidgetKind]) -> impl Fn(&Node) -> bool + '_ {
    move |node| node.widget.as_ref().is_some_and(|kind| kinds.contains(kind))
}

/// Collect the editable fields of nodes accepted by `predicate`.
///
/// Depth-first, parent before children, children in document order. Nodes
/// without an editable text field (structural elements, images, unknown
/// widgets) are skipped even if the predicate accepts them.
pub fn locate<P>(doc: &Document, predicate: P) -> Vec<EditableField>
where
    P: Fn(&Node) -> bool,
{
    fn walk<P: Fn(&Node) -> bool>(
        nodes: &[Node],
        path: &mut Vec<usize>,
        predicate: &P,
        out: &mut Vec<EditableField>,
    ) {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            if let Some(kind) = &node.widget
                && let Some(key) = kind.text_key()
                && predicate(node)
            {
                out.push(EditableField {
                    path: path.clone(),
                    node_id: node.id.clone(),
                    kind: kind.clone(),
                    key,
                });
            }
            walk(&node.children, path, predicate, out);
            path.pop();
        }
    }

    let mut fields = Vec::new();
    walk(doc.sections(), &mut Vec::new(), &predicate, &mut fields);
    fields
}

/// Rule for choosing among several eligible fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every field, in traversal order.
    #[default]
    All,
    /// The first field in traversal order.
    First,
    /// Fields whose current text contains the marker.
    Containing(String),
    /// The field of the node with this id.
    NodeId(String),
}

impl Selection {
    /// Narrow located fields down according to the rule. Order is preserved.
    #[must_use]
    pub fn apply(&self, doc: &Document, fields: Vec<EditableField>) -> Vec<EditableField> {
        match self {
            Self::All => fields,
            Self::First => fields.into_iter().take(1).collect(),
            Self::Containing(marker) => fields
                .into_iter()
                .filter(|field| {
                    doc.node_at(&field.path)
                        .and_then(|node| node.settings.text(field.key))
                        .is_some_and(|text| text.contains(marker.as_str()))
                })
                .collect(),
            Self::NodeId(id) => fields
                .into_iter()
                .filter(|field| &field.node_id == id)
                .take(1)
                .collect(),
        }
    }
}

/// Replace the text of one field.
///
/// Only `settings[field.key]` of the addressed node changes; ids, structure,
/// other settings and every other node are left as they were. Applying the
/// same text twice yields the same document as applying it once.
///
/// # Errors
///
/// Returns [`DocumentError::FieldNotFound`] if the address no longer points
/// at a widget with that text field.
pub fn mutate(
    doc: &mut Document,
    field: &EditableField,
    text: &str,
    options: MutateOptions,
) -> Result<FieldEdit, DocumentError> {
    let node = doc
        .node_at_mut(&field.path)
        .filter(|node| {
            node.id == field.node_id
                && node.widget.as_ref().and_then(WidgetKind::text_key) == Some(field.key)
        })
        .ok_or_else(|| DocumentError::FieldNotFound {
            path: format_path(&field.path),
            key: field.key.to_owned(),
        })?;

    let previous = node.settings.text(field.key).map(str::to_owned);
    let written = match (&field.kind, previous.as_deref()) {
        (WidgetKind::RichText, Some(current)) if options.preserve_wrapper => {
            rewrap(current, text)
        }
        _ => text.to_owned(),
    };

    node.set_text(field.key, written.clone());
    tracing::debug!(node_id = %field.node_id, key = field.key, "Replaced widget text");

    Ok(FieldEdit {
        node_id: field.node_id.clone(),
        key: field.key,
        previous,
        written,
    })
}

/// Put `text` inside the outer `<div>` of `current`, if it has one and
/// `text` brings no wrapper of its own.
fn rewrap(current: &str, text: &str) -> String {
    if DIV_WRAPPER_RE.is_match(text) {
        return text.to_owned();
    }
    match DIV_WRAPPER_RE.captures(current) {
        Some(caps) => format!("{}{text}{}", &caps[1], &caps[3]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::PHP_DOCUMENT;
    use crate::widget::ElementType;
    use pretty_assertions::assert_eq;

    /// Two rich-text widgets, a heading and an image spread over two sections.
    fn sample() -> Document {
        Document::new(vec![
            Node::new("s1", ElementType::Section).with_children(vec![
                Node::new("c1", ElementType::Column).with_children(vec![
                    Node::widget("h1", WidgetKind::Heading).with_text("title", "Title"),
                    Node::widget("t1", WidgetKind::RichText)
                        .with_text("editor", "<div class=\"intro\"><p>{{BODY}}</p></div>"),
                ]),
            ]),
            Node::new("s2", ElementType::Section).with_children(vec![
                Node::widget("i1", WidgetKind::parse("image")),
                Node::widget("t2", WidgetKind::RichText).with_text("editor", "<p>Footer</p>"),
            ]),
        ])
    }

    fn ids(fields: &[EditableField]) -> Vec<&str> {
        fields.iter().map(|f| f.node_id.as_str()).collect()
    }

    #[test]
    fn test_locate_traversal_order() {
        let doc = sample();
        let fields = locate(&doc, |_| true);
        assert_eq!(ids(&fields), ["h1", "t1", "t2"]);
        assert_eq!(fields[1].path, vec![0, 0, 1]);
        assert_eq!(fields[1].key, "editor");
        assert_eq!(fields[0].key, "title");
    }

    #[test]
    fn test_locate_with_widget_filter() {
        let doc = sample();
        let kinds = [WidgetKind::RichText];
        assert_eq!(ids(&locate(&doc, widget_filter(&kinds))), ["t1", "t2"]);
    }

    #[test]
    fn test_locate_skips_unsupported_widgets() {
        let doc = Document::new(vec![Node::new("s", ElementType::Section).with_children(vec![
            Node::widget("img", WidgetKind::parse("image")),
            Node::widget("pc", WidgetKind::PostContent),
        ])]);
        assert!(locate(&doc, |_| true).is_empty());
    }

    #[test]
    fn test_selection_rules() {
        let doc = sample();
        let kinds = [WidgetKind::RichText];
        let fields = locate(&doc, widget_filter(&kinds));

        assert_eq!(ids(&Selection::All.apply(&doc, fields.clone())), ["t1", "t2"]);
        assert_eq!(ids(&Selection::First.apply(&doc, fields.clone())), ["t1"]);
        assert_eq!(
            ids(&Selection::Containing("{{BODY}}".into()).apply(&doc, fields.clone())),
            ["t1"]
        );
        assert_eq!(
            ids(&Selection::NodeId("t2".into()).apply(&doc, fields.clone())),
            ["t2"]
        );
        assert!(Selection::NodeId("nope".into()).apply(&doc, fields).is_empty());
    }

    #[test]
    fn test_mutate_preserves_wrapper() {
        let mut doc = sample();
        let field = locate(&doc, |_| true).remove(1);

        let edit = mutate(&mut doc, &field, "<p>New text</p>", MutateOptions::default()).unwrap();

        assert_eq!(edit.written, "<div class=\"intro\"><p>New text</p></div>");
        assert!(edit.changed());
        assert_eq!(doc.text_of("t1", "editor"), Some(edit.written.as_str()));
    }

    #[test]
    fn test_mutate_without_wrapper_option() {
        let mut doc = sample();
        let field = locate(&doc, |_| true).remove(1);
        let options = MutateOptions {
            preserve_wrapper: false,
        };

        let edit = mutate(&mut doc, &field, "<p>New</p>", options).unwrap();
        assert_eq!(edit.written, "<p>New</p>");
    }

    #[test]
    fn test_mutate_heading_replaces_plainly() {
        let mut doc = sample();
        let field = locate(&doc, |_| true).remove(0);
        mutate(&mut doc, &field, "<div>x</div>", MutateOptions::default()).unwrap();
        assert_eq!(doc.text_of("h1", "title"), Some("<div>x</div>"));
    }

    #[test]
    fn test_mutate_touches_only_target() {
        let original = Document::decode(PHP_DOCUMENT).unwrap();
        let mut doc = original.clone();
        let kinds = [WidgetKind::RichText];
        let fields = locate(&doc, widget_filter(&kinds));
        assert_eq!(ids(&fields), ["4d5e6f70"]);

        mutate(&mut doc, &fields[0], "<p>New text</p>", MutateOptions::default()).unwrap();

        for (before, after) in original.nodes().zip(doc.nodes()) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.el_type, after.el_type);
            assert_eq!(before.widget, after.widget);
            assert_eq!(before.children.len(), after.children.len());
            if before.id == "4d5e6f70" {
                for (key, value) in before.settings.iter().filter(|(k, _)| *k != "editor") {
                    assert_eq!(after.settings.get(key), Some(value));
                }
                assert_eq!(after.settings.len(), before.settings.len());
            } else {
                assert_eq!(before.settings, after.settings);
            }
        }

        let encoded = doc.encode().unwrap();
        assert_eq!(
            encoded,
            PHP_DOCUMENT.replace(r"<p>Old text<\/p>", r"<p>New text<\/p>")
        );
    }

    #[test]
    fn test_mutate_is_idempotent() {
        let mut once = sample();
        let mut twice = sample();
        let fields = locate(&once, |_| true);

        for field in &fields {
            mutate(&mut once, field, "<div class=\"x\">Body</div>", MutateOptions::default())
                .unwrap();
        }
        for _ in 0..2 {
            for field in &fields {
                mutate(&mut twice, field, "<div class=\"x\">Body</div>", MutateOptions::default())
                    .unwrap();
            }
        }

        assert_eq!(once, twice);
        assert_eq!(once.encode().unwrap(), twice.encode().unwrap());
    }

    #[test]
    fn test_second_identical_edit_reports_unchanged() {
        let mut doc = sample();
        let field = locate(&doc, |_| true).remove(2);
        assert!(mutate(&mut doc, &field, "<p>Same</p>", MutateOptions::default()).unwrap().changed());
        assert!(!mutate(&mut doc, &field, "<p>Same</p>", MutateOptions::default()).unwrap().changed());
    }

    #[test]
    fn test_mutate_stale_field_fails() {
        let mut doc = sample();
        let mut field = locate(&doc, |_| true).remove(0);
        field.path = vec![1, 0];

        let err = mutate(&mut doc, &field, "x", MutateOptions::default()).unwrap_err();
        assert!(matches!(err, DocumentError::FieldNotFound { .. }));
    }
}
