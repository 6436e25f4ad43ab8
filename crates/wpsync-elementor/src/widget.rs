//! Element and widget type tables.

use std::fmt;
use std::str::FromStr;

use crate::error::DocumentError;

/// Structural tag of an element (`elType`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Section,
    Column,
    Container,
    Widget,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl ElementType {
    /// Map an `elType` value onto the table.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "section" => Self::Section,
            "column" => Self::Column,
            "container" => Self::Container,
            "widget" => Self::Widget,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The `elType` value as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Section => "section",
            Self::Column => "column",
            Self::Container => "container",
            Self::Widget => "widget",
            Self::Other(name) => name,
        }
    }
}

/// Capability of a leaf widget (`widgetType`).
///
/// Only the variants with a [`text_key`](Self::text_key) can be edited.
/// Everything the table does not know becomes [`WidgetKind::Other`] and is
/// skipped by the locator, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// `text-editor`: rich text (HTML) under `editor`.
    RichText,
    /// `heading`: title text under `title`.
    Heading,
    /// `text`: plain text under `text`.
    PlainText,
    /// `theme-post-content`: renders the post's native content; has no text of its own.
    PostContent,
    /// Any other widget, kept verbatim.
    Other(String),
}

impl WidgetKind {
    /// Map a `widgetType` value onto the table.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "text-editor" => Self::RichText,
            "heading" => Self::Heading,
            "text" => Self::PlainText,
            "theme-post-content" => Self::PostContent,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The `widgetType` value as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RichText => "text-editor",
            Self::Heading => "heading",
            Self::PlainText => "text",
            Self::PostContent => "theme-post-content",
            Self::Other(name) => name,
        }
    }

    /// Settings key holding the widget's text, if it has one.
    #[must_use]
    pub fn text_key(&self) -> Option<&'static str> {
        match self {
            Self::RichText => Some("editor"),
            Self::Heading => Some("title"),
            Self::PlainText => Some("text"),
            Self::PostContent | Self::Other(_) => None,
        }
    }

    /// Whether the widget carries an editable text field.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.text_key().is_some()
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses only editable widget types; used to validate user input.
impl FromStr for WidgetKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = Self::parse(s.trim());
        if kind.is_editable() {
            Ok(kind)
        } else {
            Err(DocumentError::UnsupportedWidget(s.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_table_round_trips_names() {
        for name in ["text-editor", "heading", "text", "theme-post-content", "image"] {
            assert_eq!(WidgetKind::parse(name).as_str(), name);
        }
    }

    #[test]
    fn test_text_keys() {
        assert_eq!(WidgetKind::RichText.text_key(), Some("editor"));
        assert_eq!(WidgetKind::Heading.text_key(), Some("title"));
        assert_eq!(WidgetKind::PlainText.text_key(), Some("text"));
        assert_eq!(WidgetKind::PostContent.text_key(), None);
        assert_eq!(WidgetKind::parse("image").text_key(), None);
    }

    #[test]
    fn test_from_str_accepts_only_editable() {
        assert_eq!("heading".parse::<WidgetKind>().unwrap(), WidgetKind::Heading);
        assert!(matches!(
            "image".parse::<WidgetKind>(),
            Err(DocumentError::UnsupportedWidget(name)) if name == "image"
        ));
        assert!("theme-post-content".parse::<WidgetKind>().is_err());
    }

    #[test]
    fn test_element_type_other_kept() {
        let el = ElementType::parse("inner-section");
        assert_eq!(el, ElementType::Other("inner-section".to_owned()));
        assert_eq!(el.as_str(), "inner-section");
    }
}
