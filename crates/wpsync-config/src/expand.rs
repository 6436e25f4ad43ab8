//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded, so application passwords and URLs
/// containing a literal `$` survive untouched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional string in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(inner) = value.as_mut() {
        *inner = expand_env(inner, field)?;
    }
    Ok(())
}

/// Name of an environment variable that was referenced but not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_credentials_pair() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WPSYNC_EXPAND_USER", "editor");
            std::env::set_var("WPSYNC_EXPAND_PASS", "abcd efgh ijkl");
        }
        let result = expand_env(
            "${WPSYNC_EXPAND_USER}:${WPSYNC_EXPAND_PASS}",
            "wordpress.username",
        )
        .unwrap();
        assert_eq!(result, "editor:abcd efgh ijkl");
        unsafe {
            std::env::remove_var("WPSYNC_EXPAND_USER");
            std::env::remove_var("WPSYNC_EXPAND_PASS");
        }
    }

    #[test]
    fn test_expand_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WPSYNC_EXPAND_UNSET");
        }
        let result = expand_env("${WPSYNC_EXPAND_UNSET:-posts}", "wordpress.post_type").unwrap();
        assert_eq!(result, "posts");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WPSYNC_EXPAND_MISSING");
        }
        let err = expand_env("${WPSYNC_EXPAND_MISSING}", "wordpress.app_password").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("WPSYNC_EXPAND_MISSING"));
        assert!(msg.contains("wordpress.app_password"));
    }

    #[test]
    fn test_bare_dollar_left_alone() {
        let result = expand_env("pa$$word", "wordpress.app_password").unwrap();
        assert_eq!(result, "pa$$word");
    }

    #[test]
    fn test_expand_opt_none_is_noop() {
        let mut value = None;
        expand_opt(&mut value, "cache.flush_url").unwrap();
        assert!(value.is_none());
    }
}
