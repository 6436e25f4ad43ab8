//! Element nodes of a page-builder document.

use serde_json::{Map, Value};

use crate::error::{DocumentError, format_path};
use crate::widget::{ElementType, WidgetKind};

const ID: &str = "id";
const EL_TYPE: &str = "elType";
const WIDGET_TYPE: &str = "widgetType";
const SETTINGS: &str = "settings";
const ELEMENTS: &str = "elements";

/// Element settings: an open mapping of attribute name to value.
///
/// PHP encodes an empty mapping as `[]`; that spelling is remembered so an
/// untouched empty settings bag re-encodes the same way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    values: Map<String, Value>,
    empty_as_array: bool,
}

impl Settings {
    /// Value of a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String value of a setting.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Set a string value, keeping the position of an existing key.
    pub fn set_text(&mut self, key: &str, text: impl Into<String>) {
        self.values.insert(key.to_owned(), Value::String(text.into()));
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Settings in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    fn from_value(value: Value, path: &[usize]) -> Result<Self, DocumentError> {
        match value {
            Value::Object(values) => Ok(Self {
                values,
                empty_as_array: false,
            }),
            Value::Array(items) if items.is_empty() => Ok(Self {
                values: Map::new(),
                empty_as_array: true,
            }),
            _ => Err(invalid(path, "settings must be an object")),
        }
    }

    fn to_value(&self) -> Value {
        if self.values.is_empty() && self.empty_as_array {
            Value::Array(Vec::new())
        } else {
            Value::Object(self.values.clone())
        }
    }
}

/// A section, column, container or widget.
///
/// Attributes the model does not name are carried opaquely, and the stored
/// key order is remembered, so re-encoding an untouched node yields the
/// original bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifier, unique within a document.
    pub id: String,
    /// Structural tag.
    pub el_type: ElementType,
    /// Widget capability (leaf widgets only).
    pub widget: Option<WidgetKind>,
    /// Settings bag, including the text payload of text widgets.
    pub settings: Settings,
    /// Child elements in display order.
    pub children: Vec<Node>,
    extra: Map<String, Value>,
    layout: Vec<String>,
}

impl Node {
    /// Create a node with no settings and no children.
    #[must_use]
    pub fn new(id: impl Into<String>, el_type: ElementType) -> Self {
        Self {
            id: id.into(),
            el_type,
            widget: None,
            settings: Settings::default(),
            children: Vec::new(),
            extra: Map::new(),
            layout: vec![ID.to_owned(), EL_TYPE.to_owned(), SETTINGS.to_owned(), ELEMENTS.to_owned()],
        }
    }

    /// Create a widget node.
    #[must_use]
    pub fn widget(id: impl Into<String>, kind: WidgetKind) -> Self {
        let mut node = Self::new(id, ElementType::Widget);
        node.widget = Some(kind);
        node.layout.push(WIDGET_TYPE.to_owned());
        node
    }

    /// Set a text setting.
    #[must_use]
    pub fn with_text(mut self, key: &str, text: impl Into<String>) -> Self {
        self.set_text(key, text);
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Text currently stored in the widget's editable field.
    #[must_use]
    pub fn editable_text(&self) -> Option<&str> {
        let key = self.widget.as_ref()?.text_key()?;
        self.settings.text(key)
    }

    /// Attribute the model does not name (e.g. `isInner`).
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Write a text setting. Adds a `settings` attribute if the node had none.
    pub(crate) fn set_text(&mut self, key: &str, text: impl Into<String>) {
        if !self.layout.iter().any(|k| k == SETTINGS) {
            self.layout.push(SETTINGS.to_owned());
        }
        self.settings.set_text(key, text);
    }

    pub(crate) fn from_value(value: Value, path: &mut Vec<usize>) -> Result<Self, DocumentError> {
        let Value::Object(object) = value else {
            return Err(invalid(path, "element must be an object"));
        };

        let mut id = None;
        let mut el_type = None;
        let mut widget = None;
        let mut settings = Settings::default();
        let mut children = Vec::new();
        let mut extra = Map::new();
        let mut layout = Vec::with_capacity(object.len());

        for (key, value) in object {
            match key.as_str() {
                ID => match value {
                    Value::String(s) => id = Some(s),
                    _ => return Err(invalid(path, "id must be a string")),
                },
                EL_TYPE => match value {
                    Value::String(s) => el_type = Some(ElementType::parse(&s)),
                    _ => return Err(invalid(path, "elType must be a string")),
                },
                WIDGET_TYPE => match value {
                    Value::String(s) => widget = Some(WidgetKind::parse(&s)),
                    _ => return Err(invalid(path, "widgetType must be a string")),
                },
                SETTINGS => settings = Settings::from_value(value, path)?,
                ELEMENTS => {
                    let Value::Array(items) = value else {
                        return Err(invalid(path, "elements must be an array"));
                    };
                    children.reserve(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        path.push(index);
                        children.push(Self::from_value(item, path)?);
                        path.pop();
                    }
                }
                _ => {
                    extra.insert(key.clone(), value);
                }
            }
            layout.push(key);
        }

        Ok(Self {
            id: id.ok_or_else(|| invalid(path, "missing id"))?,
            el_type: el_type.ok_or_else(|| invalid(path, "missing elType"))?,
            widget,
            settings,
            children,
            extra,
            layout,
        })
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.layout.len());
        for key in &self.layout {
            let value = match key.as_str() {
                ID => Value::String(self.id.clone()),
                EL_TYPE => Value::String(self.el_type.as_str().to_owned()),
                WIDGET_TYPE => match &self.widget {
                    Some(kind) => Value::String(kind.as_str().to_owned()),
                    None => continue,
                },
                SETTINGS => self.settings.to_value(),
                ELEMENTS => Value::Array(self.children.iter().map(Self::to_value).collect()),
                other => match self.extra.get(other) {
                    Some(value) => value.clone(),
                    None => continue,
                },
            };
            object.insert(key.clone(), value);
        }
        Value::Object(object)
    }
}

fn invalid(path: &[usize], reason: &str) -> DocumentError {
    DocumentError::InvalidNode {
        path: format_path(path),
        reason: reason.to_owned(),
    }
}
