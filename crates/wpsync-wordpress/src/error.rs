//! Error types for the WordPress REST API.

use serde::Deserialize;

/// Error codes WordPress returns with a 403 when the credentials are valid
/// but lack a capability, or are not accepted at all.
const PERMISSION_DENIED_CODES: &[&str] = &[
    "rest_forbidden",
    "rest_cannot_edit",
    "rest_cannot_update",
    "rest_cannot_read",
    "rest_cannot_publish",
    "incorrect_password",
    "invalid_username",
];

/// Error code of a 404 for an unknown post id. Other 404s mean a wrong route.
const INVALID_POST_ID_CODE: &str = "rest_post_invalid_id";

/// Longest excerpt of a non-JSON error body kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Error from WordPress REST API operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WordPressError {
    /// Credentials rejected or insufficient.
    #[error("authorization failed (HTTP {status}): {message}")]
    Authorization {
        /// HTTP status code.
        status: u16,
        /// WordPress error code, if the body carried one.
        code: Option<String>,
        /// Server message.
        message: String,
    },

    /// The post id does not resolve.
    #[error("post not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// The post was modified concurrently.
    #[error("conflicting update: {message}")]
    Conflict {
        /// Server message.
        message: String,
    },

    /// Network failure, timeout, or gateway error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other HTTP error, e.g. an unknown route or an edge proxy block.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// WordPress error code, if the body carried one.
        code: Option<String>,
        /// Server message or body excerpt.
        message: String,
    },

    /// Response body is not the expected JSON.
    #[error("invalid response JSON")]
    Json(#[from] serde_json::Error),
}

impl WordPressError {
    /// Whether the failure may go away on its own (worth one retry).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// What the operator should check.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Authorization { .. } => {
                "Check the username and application password, and that the user can edit this post."
            }
            Self::NotFound { .. } => "Check the post id and `wordpress.post_type`.",
            Self::Conflict { .. } => {
                "Someone else changed the post; review their edit before running again."
            }
            Self::Transport(_) => {
                "Check network access to `wordpress.base_url`, or raise `wordpress.timeout_secs`."
            }
            Self::Rejected { .. } => {
                "Check that the REST API is reachable under /wp-json and not blocked by a proxy."
            }
            Self::Json(_) => "A plugin or proxy may be rewriting REST responses.",
        }
    }
}

/// WordPress REST error body: `{"code": "...", "message": "...", "data": {...}}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map an HTTP error response to the error taxonomy.
pub(crate) fn classify(status: u16, body: &str) -> WordPressError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code;
    let message = parsed.message.unwrap_or_else(|| excerpt(body));

    match status {
        401 => WordPressError::Authorization {
            status,
            code,
            message,
        },
        403 if code
            .as_deref()
            .is_some_and(|c| PERMISSION_DENIED_CODES.contains(&c)) =>
        {
            WordPressError::Authorization {
                status,
                code,
                message,
            }
        }
        404 if code.as_deref() == Some(INVALID_POST_ID_CODE) => WordPressError::NotFound { message },
        409 => WordPressError::Conflict { message },
        502..=504 => WordPressError::Transport(format!("HTTP {status}: {message}")),
        _ => WordPressError::Rejected {
            status,
            code,
            message,
        },
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_owned();
    }
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_401() {
        let err = classify(
            401,
            r#"{"code":"rest_not_logged_in","message":"You are not currently logged in.","data":{"status":401}}"#,
        );
        assert!(matches!(err, WordPressError::Authorization { status: 401, .. }));
    }

    #[test]
    fn test_classify_403_permission_signature() {
        let err = classify(
            403,
            r#"{"code":"rest_cannot_edit","message":"Sorry, you are not allowed to edit this post.","data":{"status":403}}"#,
        );
        match err {
            WordPressError::Authorization { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("rest_cannot_edit"));
                assert_eq!(message, "Sorry, you are not allowed to edit this post.");
            }
            other => panic!("expected Authorization, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_403_without_signature_is_rejected() {
        let err = classify(403, "<html><body>Access denied by firewall</body></html>");
        match err {
            WordPressError::Rejected { status, code, message } => {
                assert_eq!(status, 403);
                assert_eq!(code, None);
                assert!(message.contains("firewall"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_404_invalid_post_id() {
        let err = classify(
            404,
            r#"{"code":"rest_post_invalid_id","message":"Invalid post ID.","data":{"status":404}}"#,
        );
        assert!(matches!(err, WordPressError::NotFound { .. }));
    }

    #[test]
    fn test_classify_404_no_route_is_rejected() {
        let err = classify(
            404,
            r#"{"code":"rest_no_route","message":"No route was found matching the URL and request method.","data":{"status":404}}"#,
        );
        assert!(matches!(err, WordPressError::Rejected { status: 404, .. }));
    }

    #[test]
    fn test_classify_409_conflict() {
        assert!(matches!(classify(409, "{}"), WordPressError::Conflict { .. }));
    }

    #[test]
    fn test_classify_gateway_errors_are_transient() {
        for status in [502, 503, 504] {
            let err = classify(status, "Bad Gateway");
            assert!(err.is_transient(), "{status} should be transient");
        }
        assert!(!classify(500, "boom").is_transient());
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "x".repeat(500);
        let err = classify(500, &body);
        let WordPressError::Rejected { message, .. } = err else {
            panic!("expected Rejected");
        };
        assert_eq!(message.len(), BODY_EXCERPT_LEN + 3);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_excerpt_empty_body() {
        let WordPressError::Rejected { message, .. } = classify(418, "  ") else {
            panic!("expected Rejected");
        };
        assert_eq!(message, "(empty response body)");
    }
}
