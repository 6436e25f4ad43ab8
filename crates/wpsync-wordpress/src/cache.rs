//! Best-effort cache flush after a verified update.

use std::process::Command;

use tracing::{info, warn};
use wpsync_config::CacheConfig;

use crate::api::PostsApi;

/// One flush action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheFlush {
    /// Run a program, e.g. `wp elementor flush-css`.
    Command(Vec<String>),
    /// Send a `POST` to an endpoint; credentials only on the site's origin.
    Url(String),
}

impl CacheFlush {
    /// Flush actions configured in `[cache]`; the command runs first.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Vec<Self> {
        let mut actions = Vec::new();
        if let Some(argv) = &config.flush_command
            && !argv.is_empty()
        {
            actions.push(Self::Command(argv.clone()));
        }
        if let Some(url) = &config.flush_url {
            actions.push(Self::Url(url.clone()));
        }
        actions
    }

    /// Run the action. Failures are logged, never raised.
    pub(crate) fn run(&self, api: &dyn PostsApi) -> bool {
        match self {
            Self::Command(argv) => {
                let Some((program, args)) = argv.split_first() else {
                    return false;
                };
                match Command::new(program).args(args).status() {
                    Ok(status) if status.success() => {
                        info!(program, "Cache flush command succeeded");
                        true
                    }
                    Ok(status) => {
                        warn!(program, %status, "Cache flush command failed");
                        false
                    }
                    Err(err) => {
                        warn!(program, error = %err, "Cache flush command could not run");
                        false
                    }
                }
            }
            Self::Url(url) => match api.trigger(url) {
                Ok(()) => {
                    info!(url, "Cache flush request succeeded");
                    true
                }
                Err(err) => {
                    warn!(url, error = %err, "Cache flush request failed");
                    false
                }
            },
        }
    }
}

/// Run every action; `true` only if all succeeded.
pub(crate) fn flush_all(actions: &[CacheFlush], api: &dyn PostsApi) -> bool {
    actions
        .iter()
        .map(|action| action.run(api))
        .fold(true, |all, ok| all && ok)
}
