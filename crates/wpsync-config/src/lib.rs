//! Configuration management for wpsync.
//!
//! Parses `wpsync.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `wordpress.base_url`
//! - `wordpress.username`
//! - `wordpress.app_password`
//! - `wordpress.post_type`
//! - `sync.placeholder`
//! - `cache.flush_url`
//! - `cache.flush_command` (every argument)

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wpsync.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the publish mode.
    pub mode: Option<PublishMode>,
    /// Override the eligible widget types.
    pub widgets: Option<Vec<String>>,
    /// Override the multi-match selection rule.
    pub selection: Option<SelectionMode>,
    /// Override the placeholder filter.
    pub placeholder: Option<String>,
    /// Disable the post-update cache flush.
    pub no_flush: bool,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WordPress connection (required by every command that talks to a site).
    pub wordpress: Option<WordPressConfig>,
    /// Synchronization behavior.
    pub sync: SyncConfig,
    /// Post-update verification.
    pub verify: VerifyConfig,
    /// Best-effort cache flush after a verified update.
    pub cache: CacheConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// WordPress connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WordPressConfig {
    /// Site URL, e.g. `https://blog.example.com`.
    pub base_url: String,
    /// Account name the application password belongs to.
    pub username: String,
    /// Application password (spaces are significant).
    pub app_password: String,
    /// REST base of the post type (`posts`, `pages`, ...).
    #[serde(default = "default_post_type")]
    pub post_type: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay before the single transport retry, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Identifying client header. Defaults to `wpsync/<version>`.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_post_type() -> String {
    "posts".to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl WordPressConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "wordpress.base_url")?;
        require_non_empty(&self.username, "wordpress.username")?;
        require_non_empty(&self.app_password, "wordpress.app_password")?;
        require_non_empty(&self.post_type, "wordpress.post_type")?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "wordpress.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if let Some((scheme, _)) = self.base_url.trim().split_once("://")
            && !scheme.eq_ignore_ascii_case("http")
            && !scheme.eq_ignore_ascii_case("https")
        {
            return Err(ConfigError::Validation(format!(
                "wordpress.base_url must use http or https, not {scheme}://"
            )));
        }
        let normalized = self.normalized_base_url();
        if normalized.len() <= "https://".len() || normalized.contains(' ') {
            return Err(ConfigError::Validation(format!(
                "wordpress.base_url is not a valid site URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Site URL in canonical form.
    ///
    /// Adds `https://` when no scheme is given, upgrades `http://` to
    /// `https://` (Basic credentials must never travel in clear text), and
    /// strips a trailing `/wp-json` and trailing slashes.
    #[must_use]
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

/// Canonicalize a WordPress site URL. See [`WordPressConfig::normalized_base_url`].
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    let rest = match url.split_once("://") {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") =>
        {
            rest
        }
        _ => url,
    };
    let mut url = format!("https://{rest}");

    loop {
        let trimmed = url.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix("/wp-json").unwrap_or(trimmed);
        if trimmed.len() == url.len() {
            break;
        }
        url = trimmed.to_owned();
    }
    url
}

/// Target status of a synchronization cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Review first: the post is taken off the public site until an editor publishes it.
    #[default]
    Draft,
    /// Overwrite the live row directly.
    Publish,
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

impl FromStr for PublishMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "publish" => Ok(Self::Publish),
            other => Err(ConfigError::Validation(format!(
                "unknown publish mode '{other}' (expected draft or publish)"
            ))),
        }
    }
}

/// Which of several eligible fields receive the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Every eligible field, in document order.
    #[default]
    All,
    /// Only the first eligible field in document order.
    First,
}

impl FromStr for SelectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            other => Err(ConfigError::Validation(format!(
                "unknown selection '{other}' (expected all or first)"
            ))),
        }
    }
}

/// Synchronization behavior.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Target status for updates.
    pub mode: PublishMode,
    /// Widget types whose text is replaced.
    pub widgets: Vec<String>,
    /// Tie-break rule for multiple eligible fields.
    pub selection: SelectionMode,
    /// Only replace fields whose current text contains this marker.
    pub placeholder: Option<String>,
    /// Keep an existing outer `<div>` wrapper of rich-text widgets.
    pub preserve_wrapper: bool,
    /// Also write the new text into the native content field (search/SEO fallback).
    pub update_native_content: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: PublishMode::Draft,
            widgets: vec!["text-editor".to_owned()],
            selection: SelectionMode::All,
            placeholder: None,
            preserve_wrapper: true,
            update_native_content: true,
        }
    }
}

/// Verification settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Also check that the rendered view shows the new text.
    pub rendered: bool,
}

/// Cache flush settings. Both may be set; the command runs first.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Command and arguments, e.g. `["wp", "elementor", "flush-css"]`.
    pub flush_command: Option<Vec<String>>,
    /// HTTPS endpoint that receives a POST (authenticated on the site's own origin).
    pub flush_url: Option<String>,
}

impl CacheConfig {
    /// Whether any flush action is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.flush_command.as_ref().is_some_and(|c| !c.is_empty()) || self.flush_url.is_some()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`wordpress.app_password`").
        field: String,
        /// Error message (e.g., "${`WP_APP_PASSWORD`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wpsync.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(mode) = settings.mode {
            self.sync.mode = mode;
        }
        if let Some(widgets) = &settings.widgets {
            self.sync.widgets.clone_from(widgets);
        }
        if let Some(selection) = settings.selection {
            self.sync.selection = selection;
        }
        if let Some(placeholder) = &settings.placeholder {
            self.sync.placeholder = Some(placeholder.clone());
        }
        if settings.no_flush {
            self.cache = CacheConfig::default();
        }
    }

    /// Get validated WordPress configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_wordpress(&self) -> Result<&WordPressConfig, ConfigError> {
        let wp = self.wordpress.as_ref().ok_or_else(|| {
            ConfigError::Validation("[wordpress] section required in config".into())
        })?;
        wp.validate()?;
        Ok(wp)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// The `[wordpress]` section is not validated here; commands that need it
    /// call [`Config::require_wordpress`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.widgets.is_empty() {
            return Err(ConfigError::Validation(
                "sync.widgets must list at least one widget type".to_owned(),
            ));
        }
        for widget in &self.sync.widgets {
            require_non_empty(widget, "sync.widgets")?;
        }
        if let Some(placeholder) = &self.sync.placeholder {
            require_non_empty(placeholder, "sync.placeholder")?;
        }
        if let Some(command) = &self.cache.flush_command
            && command.first().is_some_and(|program| program.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "cache.flush_command must start with a program name".to_owned(),
            ));
        }
        if let Some(url) = &self.cache.flush_url
            && !url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "cache.flush_url must start with https://".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut wp) = self.wordpress {
            wp.base_url = expand::expand_env(&wp.base_url, "wordpress.base_url")?;
            wp.username = expand::expand_env(&wp.username, "wordpress.username")?;
            wp.app_password = expand::expand_env(&wp.app_password, "wordpress.app_password")?;
            wp.post_type = expand::expand_env(&wp.post_type, "wordpress.post_type")?;
        }

        expand::expand_opt(&mut self.sync.placeholder, "sync.placeholder")?;
        expand::expand_opt(&mut self.cache.flush_url, "cache.flush_url")?;
        if let Some(ref mut command) = self.cache.flush_command {
            for arg in command.iter_mut() {
                *arg = expand::expand_env(arg, "cache.flush_command")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Create a valid WordPress config for testing.
    fn valid_wordpress_config() -> WordPressConfig {
        WordPressConfig {
            base_url: "https://blog.example.com".to_owned(),
            username: "editor".to_owned(),
            app_password: "abcd efgh ijkl mnop".to_owned(),
            post_type: "posts".to_owned(),
            timeout_secs: 30,
            retry_backoff_ms: 500,
            user_agent: None,
        }
    }

    fn assert_validation_error(result: Result<(), ConfigError>, expected_substrings: &[&str]) {
        let err = result.expect_err("expected validation to fail");
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.wordpress.is_none());
        assert_eq!(config.sync.mode, PublishMode::Draft);
        assert_eq!(config.sync.widgets, vec!["text-editor".to_owned()]);
        assert_eq!(config.sync.selection, SelectionMode::All);
        assert!(config.sync.preserve_wrapper);
        assert!(config.sync.update_native_content);
        assert!(!config.verify.rendered);
        assert!(!config.cache.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[wordpress]
base_url = "https://blog.example.com"
username = "editor"
app_password = "abcd efgh"
post_type = "pages"
timeout_secs = 10

[sync]
mode = "publish"
widgets = ["text-editor", "heading"]
selection = "first"
placeholder = "{{BODY}}"
preserve_wrapper = false

[verify]
rendered = true

[cache]
flush_command = ["wp", "elementor", "flush-css"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let wp = config.wordpress.as_ref().unwrap();
        assert_eq!(wp.post_type, "pages");
        assert_eq!(wp.timeout_secs, 10);
        assert_eq!(wp.retry_backoff_ms, 500);
        assert_eq!(config.sync.mode, PublishMode::Publish);
        assert_eq!(config.sync.selection, SelectionMode::First);
        assert_eq!(config.sync.placeholder.as_deref(), Some("{{BODY}}"));
        assert!(!config.sync.preserve_wrapper);
        assert!(config.sync.update_native_content);
        assert!(config.verify.rendered);
        assert!(config.cache.is_configured());
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let toml = r#"
[sync]
mode = "pending"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("blog.example.com"), "https://blog.example.com");
        assert_eq!(
            normalize_base_url("http://blog.example.com/"),
            "https://blog.example.com"
        );
        assert_eq!(
            normalize_base_url("https://blog.example.com/wp-json/"),
            "https://blog.example.com"
        );
        assert_eq!(
            normalize_base_url("https://example.com/blog/wp-json"),
            "https://example.com/blog"
        );
        assert_eq!(
            normalize_base_url("HTTP://blog.example.com"),
            "https://blog.example.com"
        );
    }

    #[test]
    fn test_wordpress_config_validate_valid() {
        assert!(valid_wordpress_config().validate().is_ok());
    }

    #[test]
    fn test_wordpress_config_validate_empty_password() {
        let config = WordPressConfig {
            app_password: String::new(),
            ..valid_wordpress_config()
        };
        assert_validation_error(config.validate(), &["app_password", "empty"]);
    }

    #[test]
    fn test_wordpress_config_validate_zero_timeout() {
        let config = WordPressConfig {
            timeout_secs: 0,
            ..valid_wordpress_config()
        };
        assert_validation_error(config.validate(), &["timeout_secs"]);
    }

    #[test]
    fn test_require_wordpress_missing_section() {
        let config = Config::default();
        let err = config.require_wordpress().unwrap_err();
        assert!(err.to_string().contains("[wordpress]"));
    }

    #[test]
    fn test_validate_empty_widgets() {
        let mut config = Config::default();
        config.sync.widgets.clear();
        assert_validation_error(config.validate(), &["sync.widgets"]);
    }

    #[test]
    fn test_validate_flush_url_scheme() {
        let mut config = Config::default();
        config.cache.flush_url = Some("ftp://cache".to_owned());
        assert_validation_error(config.validate(), &["cache.flush_url", "https"]);
    }

    #[test]
    fn test_validate_flush_url_rejects_plain_http() {
        let mut config = Config::default();
        config.cache.flush_url = Some("http://127.0.0.1:8080/purge".to_owned());
        assert_validation_error(config.validate(), &["cache.flush_url", "https://"]);

        config.cache.flush_url = Some("https://cdn.example.com/purge".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wordpress_config_validate_foreign_scheme() {
        for base_url in ["ftp://blog.example.com", "file:///var/www"] {
            let config = WordPressConfig {
                base_url: base_url.to_owned(),
                ..valid_wordpress_config()
            };
            assert_validation_error(config.validate(), &["wordpress.base_url", "http or https"]);
        }

        let config = WordPressConfig {
            base_url: "HTTP://blog.example.com".to_owned(),
            ..valid_wordpress_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.cache.flush_url = Some("https://blog.example.com/flush".to_owned());

        config.apply_cli_settings(&CliSettings {
            mode: Some(PublishMode::Publish),
            widgets: Some(vec!["heading".to_owned()]),
            selection: Some(SelectionMode::First),
            placeholder: Some("TODO".to_owned()),
            no_flush: true,
        });

        assert_eq!(config.sync.mode, PublishMode::Publish);
        assert_eq!(config.sync.widgets, vec!["heading".to_owned()]);
        assert_eq!(config.sync.selection, SelectionMode::First);
        assert_eq!(config.sync.placeholder.as_deref(), Some("TODO"));
        assert!(!config.cache.is_configured());
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.sync.mode, PublishMode::Draft);
        assert_eq!(config.sync.widgets, vec!["text-editor".to_owned()]);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("draft".parse::<PublishMode>().unwrap(), PublishMode::Draft);
        assert_eq!("publish".parse::<PublishMode>().unwrap(), PublishMode::Publish);
        assert!("live".parse::<PublishMode>().is_err());
        assert_eq!(PublishMode::Publish.to_string(), "publish");
    }

    #[test]
    fn test_expand_env_vars_wordpress() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WPSYNC_TEST_SITE", "https://blog.test");
            std::env::set_var("WPSYNC_TEST_PASSWORD", "xxxx yyyy");
        }

        let toml = r#"
[wordpress]
base_url = "${WPSYNC_TEST_SITE}"
username = "${WPSYNC_TEST_USER:-editor}"
app_password = "${WPSYNC_TEST_PASSWORD}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        let wp = config.wordpress.unwrap();
        assert_eq!(wp.base_url, "https://blog.test");
        assert_eq!(wp.username, "editor");
        assert_eq!(wp.app_password, "xxxx yyyy");

        unsafe {
            std::env::remove_var("WPSYNC_TEST_SITE");
            std::env::remove_var("WPSYNC_TEST_PASSWORD");
        }
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/wpsync.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("posts").join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[sync]\nmode = \"publish\"\n").unwrap();

        let found = Config::discover_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILENAME));

        let config = Config::load(Some(&found), None).unwrap();
        assert_eq!(config.sync.mode, PublishMode::Publish);
        assert_eq!(config.config_path, Some(found));
    }
}
