//! HTTP Basic authentication with an application password.

use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// Precomputed `Authorization` header value.
pub(crate) struct BasicAuth {
    header: String,
}

impl BasicAuth {
    pub(crate) fn new(username: &str, secret: &str) -> Self {
        let credentials = BASE64_STANDARD.encode(format!("{username}:{secret}"));
        Self {
            header: format!("Basic {credentials}"),
        }
    }

    pub(crate) fn header_value(&self) -> &str {
        &self.header
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BasicAuth(<redacted>)")
    }
}
