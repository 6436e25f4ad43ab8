//! String codec for the `_elementor_data` meta value.
//!
//! The stored value is compact JSON produced by PHP's `json_encode`, which by
//! default escapes `/` as `\/` and every non-ASCII character as `\uXXXX`.
//! Documents written by other clients may use literal slashes or literal
//! UTF-8 instead. The style is detected on decode and reproduced on encode so
//! an untouched document round-trips byte for byte.

use std::io;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;

use crate::error::DocumentError;
use crate::node::Node;

/// Escaping conventions of an encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingStyle {
    /// Write `/` as `\/`.
    pub escape_slashes: bool,
    /// Write non-ASCII characters as `\uXXXX` (UTF-16 code units).
    pub escape_unicode: bool,
}

impl EncodingStyle {
    /// PHP `json_encode` defaults, as used by Elementor itself.
    pub const PHP: Self = Self {
        escape_slashes: true,
        escape_unicode: true,
    };

    /// Literal slashes and UTF-8.
    pub const UNESCAPED: Self = Self {
        escape_slashes: false,
        escape_unicode: false,
    };

    /// Detect the style of an encoded document.
    ///
    /// Conventions that cannot be observed (no slash, no non-ASCII text)
    /// fall back to the PHP defaults.
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        let mut escaped_slash = false;
        let mut literal_slash = false;
        let mut literal_non_ascii = false;

        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if chars.next() == Some('/') {
                        escaped_slash = true;
                    }
                }
                '/' => literal_slash = true,
                c if !c.is_ascii() => literal_non_ascii = true,
                _ => {}
            }
        }

        Self {
            escape_slashes: escaped_slash || !literal_slash,
            escape_unicode: !literal_non_ascii,
        }
    }
}

impl Default for EncodingStyle {
    fn default() -> Self {
        Self::PHP
    }
}

/// Compact formatter that applies an [`EncodingStyle`] on top of the
/// standard JSON escapes.
struct StyledFormatter {
    style: EncodingStyle,
}

impl Formatter for StyledFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, c) in fragment.char_indices() {
            let slash = c == '/' && self.style.escape_slashes;
            let unicode = !c.is_ascii() && self.style.escape_unicode;
            if !slash && !unicode {
                continue;
            }

            writer.write_all(&fragment.as_bytes()[start..index])?;
            if slash {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
            start = index + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Parse an encoded document into its node forest.
pub(crate) fn decode(raw: &str) -> Result<(Vec<Node>, EncodingStyle), DocumentError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(DocumentError::RootNotArray);
    };

    let mut path = Vec::with_capacity(8);
    let mut nodes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        path.push(index);
        nodes.push(Node::from_value(item, &mut path)?);
        path.pop();
    }

    Ok((nodes, EncodingStyle::detect(raw)))
}

/// Serialize a node forest in the given style.
pub(crate) fn encode(nodes: &[Node], style: EncodingStyle) -> Result<String, DocumentError> {
    let value = Value::Array(nodes.iter().map(Node::to_value).collect());

    let mut out = Vec::with_capacity(1024);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, StyledFormatter { style });
    value.serialize(&mut serializer)?;

    Ok(String::from_utf8(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode_str(text: &str, style: EncodingStyle) -> String {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, StyledFormatter { style });
        text.serialize(&mut serializer).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_php_style_escapes() {
        assert_eq!(
            encode_str("<p>Café</p>", EncodingStyle::PHP),
            r#""<p>Caf\u00e9<\/p>""#
        );
    }

    #[test]
    fn test_php_style_astral_uses_surrogate_pair() {
        assert_eq!(
            encode_str("🎵", EncodingStyle::PHP),
            r#""\ud83c\udfb5""#
        );
    }

    #[test]
    fn test_unescaped_style_keeps_text() {
        assert_eq!(
            encode_str("<p>Café</p>", EncodingStyle::UNESCAPED),
            r#""<p>Café</p>""#
        );
    }

    #[test]
    fn test_standard_escapes_unchanged() {
        assert_eq!(
            encode_str("a\"b\\c\nd\te\u{1}", EncodingStyle::PHP),
            r#""a\"b\\c\nd\te\u0001""#
        );
    }

    #[test]
    fn test_detect_php() {
        let style = EncodingStyle::detect(r#"[{"u":"https:\/\/x.test","t":"Caf\u00e9"}]"#);
        assert_eq!(style, EncodingStyle::PHP);
    }

    #[test]
    fn test_detect_unescaped() {
        let style = EncodingStyle::detect(r#"[{"u":"https://x.test","t":"Café"}]"#);
        assert_eq!(style, EncodingStyle::UNESCAPED);
    }

    #[test]
    fn test_detect_escaped_backslash_before_slash_is_literal_slash() {
        // `\\/` is an escaped backslash followed by a literal slash.
        let style = EncodingStyle::detect(r#"["a\\/b"]"#);
        assert!(!style.escape_slashes);
    }

    #[test]
    fn test_detect_defaults_to_php() {
        assert_eq!(EncodingStyle::detect(r#"[{"id":"a"}]"#), EncodingStyle::PHP);
    }

    #[test]
    fn test_decode_rejects_object_root() {
        assert!(matches!(
            decode(r#"{"id":"a","elType":"section"}"#),
            Err(DocumentError::RootNotArray)
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(decode("[{"), Err(DocumentError::Json(_))));
        assert!(matches!(decode(""), Err(DocumentError::Json(_))));
    }
}
