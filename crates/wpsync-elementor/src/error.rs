//! Error types for page-builder documents.

/// Error while decoding, encoding or editing a page-builder document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// The raw string is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not an array of elements.
    #[error("document root must be an array of elements")]
    RootNotArray,

    /// An element does not have the expected shape.
    #[error("element at {path}: {reason}")]
    InvalidNode {
        /// Child-index path of the element, e.g. `0/1/2`.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two elements share an id.
    #[error("duplicate element id '{0}'")]
    DuplicateId(String),

    /// Re-encoding produced bytes that are not UTF-8.
    #[error("encoded document is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A field address no longer points at an editable widget.
    #[error("no editable field '{key}' at {path}")]
    FieldNotFound {
        /// Child-index path the field pointed at.
        path: String,
        /// Settings key of the field.
        key: String,
    },

    /// Widget type name that has no editable text field.
    #[error("widget type '{0}' has no editable text field")]
    UnsupportedWidget(String),
}

/// Render a child-index path as `0/1/2`.
pub(crate) fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
