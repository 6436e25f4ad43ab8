//! WordPress REST API client.
//!
//! Provides a sync HTTP client for the `wp/v2` REST API with HTTP Basic
//! authentication (application passwords).

mod posts;
mod site;

use std::time::Duration;

use tracing::{debug, warn};
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};
use wpsync_config::WordPressConfig;

use crate::auth::BasicAuth;
use crate::error::{WordPressError, classify};

/// Identifying client header sent when none is configured.
const DEFAULT_USER_AGENT: &str = concat!("wpsync/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// WordPress REST API client.
pub struct WordPressClient {
    agent: Agent,
    site_url: String,
    posts_url: String,
    auth: BasicAuth,
    user_agent: String,
    retry_backoff: Duration,
}

impl WordPressClient {
    /// Create a client from the `[wordpress]` configuration section.
    #[must_use]
    pub fn from_config(config: &WordPressConfig) -> Self {
        Self::with_site_url(config, config.normalized_base_url())
    }

    /// Create a client for an already normalized site URL.
    fn with_site_url(config: &WordPressConfig, site_url: String) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            posts_url: format!(
                "{site_url}/wp-json/wp/v2/{}",
                config.post_type.trim_matches('/')
            ),
            site_url,
            auth: BasicAuth::new(&config.username, &config.app_password),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// REST URL of a post.
    fn post_url(&self, id: u64) -> String {
        format!("{}/{id}", self.posts_url)
    }

    /// REST URL of a route under `/wp-json`.
    fn rest_url(&self, route: &str) -> String {
        format!("{}/wp-json/{}", self.site_url, route.trim_start_matches('/'))
    }

    /// Whether `url` is served by the configured site, so credentials may go there.
    fn is_same_origin(&self, url: &str) -> bool {
        origin(url).is_some_and(|o| Some(o) == origin(&self.site_url))
    }

    /// Common headers; the Authorization header only when `authenticated`.
    fn headers<B>(&self, request: RequestBuilder<B>, authenticated: bool) -> RequestBuilder<B> {
        let request = request
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", JSON);
        if authenticated {
            request.header("Authorization", self.auth.header_value())
        } else {
            request
        }
    }

    fn get(&self, url: &str) -> Result<String, WordPressError> {
        self.execute("GET", url, || self.headers(self.agent.get(url), true).call())
    }

    fn put_json(&self, url: &str, payload: &[u8]) -> Result<String, WordPressError> {
        self.execute("PUT", url, || {
            self.headers(self.agent.put(url), true)
                .header("Content-Type", JSON)
                .send(payload)
        })
    }

    /// Empty `POST`. Credentials are attached only for the site's own origin.
    fn post_empty(&self, url: &str) -> Result<String, WordPressError> {
        let authenticated = self.is_same_origin(url);
        if !authenticated {
            debug!(url, "Foreign origin, sending without credentials");
        }
        self.execute("POST", url, || {
            self.headers(self.agent.post(url), authenticated).send_empty()
        })
    }

    /// Perform a request (retrying once on transient failure) and return
    /// the body of a successful response.
    fn execute<F>(&self, method: &str, url: &str, send: F) -> Result<String, WordPressError>
    where
        F: Fn() -> Result<Response<Body>, ureq::Error>,
    {
        retry_once(self.retry_backoff, |attempt| {
            debug!(method, url, attempt, "Sending request");
            let response = send().map_err(|e| WordPressError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .into_body()
                .read_to_string()
                .map_err(|e| WordPressError::Transport(e.to_string()))?;
            debug!(method, url, status, "Received response");

            if status >= 400 {
                return Err(classify(status, &body));
            }
            Ok(body)
        })
    }
}

/// Lowercased `scheme://host[:port]` of an absolute URL, default ports dropped.
fn origin(url: &str) -> Option<String> {
    let (scheme, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    if authority.is_empty() {
        return None;
    }
    let scheme = scheme.to_ascii_lowercase();
    let mut authority = authority.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "https" => ":443",
        "http" => ":80",
        _ => "",
    };
    if !default_port.is_empty() && authority.ends_with(default_port) {
        authority.truncate(authority.len() - default_port.len());
    }
    Some(format!("{scheme}://{authority}"))
}

/// Run `op`; if it fails transiently, wait `backoff` and run it exactly once more.
pub(crate) fn retry_once<T, F>(backoff: Duration, mut op: F) -> Result<T, WordPressError>
where
    F: FnMut(u32) -> Result<T, WordPressError>,
{
    match op(1) {
        Err(err) if err.is_transient() => {
            warn!(error = %err, ?backoff, "Transient failure, retrying once");
            std::thread::sleep(backoff);
            op(2)
        }
        result => result,
    }
}
