//! Elementor page-builder document model for wpsync.
//!
//! Elementor keeps a post's layout and text in the `_elementor_data` meta
//! field as a JSON document encoded into a single string. Once that field
//! exists, WordPress renders it and ignores the native `content` field, so
//! text changes have to be written into the document itself.
//!
//! This crate provides:
//! - [`Document`]: the node forest, with a decode/encode codec that
//!   reproduces the stored byte sequence exactly for unmodified documents
//! - [`locate`] and [`mutate`]: find editable text fields by widget type and
//!   replace their text without touching anything else
//!
//! # Example
//!
//! ```
//! use wpsync_elementor::{Document, MutateOptions, Selection, WidgetKind, locate, mutate, widget_filter};
//!
//! let raw = r#"[{"id":"a1","elType":"widget","settings":{"editor":"<p>Old<\/p>"},"elements":[],"widgetType":"text-editor"}]"#;
//! let mut doc = Document::decode(raw)?;
//!
//! let kinds = [WidgetKind::RichText];
//! let fields = Selection::All.apply(&doc, locate(&doc, widget_filter(&kinds)));
//! for field in &fields {
//!     mutate(&mut doc, field, "<p>New</p>", MutateOptions::default())?;
//! }
//!
//! assert!(doc.encode()?.contains(r"<p>New<\/p>"));
//! # Ok::<(), wpsync_elementor::DocumentError>(())
//! ```

mod codec;
mod document;
pub mod error;
mod locate;
mod node;
mod widget;

pub use codec::EncodingStyle;
pub use document::{Descendants, Document};
pub use error::DocumentError;
pub use locate::{
    EditableField, FieldEdit, MutateOptions, Selection, locate, mutate, widget_filter,
};
pub use node::{Node, Settings};
pub use widget::{ElementType, WidgetKind};

/// Meta key holding the encoded document.
pub const DATA_META_KEY: &str = "_elementor_data";

/// Meta key holding the edit-mode flag.
pub const EDIT_MODE_META_KEY: &str = "_elementor_edit_mode";

/// Edit-mode value under which Elementor renders the document instead of the
/// native content.
pub const BUILDER_EDIT_MODE: &str = "builder";
