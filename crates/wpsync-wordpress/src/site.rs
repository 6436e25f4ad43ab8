//! Site readiness check: REST discovery and credentials.
//!
//! Runs without touching any post. The sync needs the core REST namespace
//! and credentials of a user who can edit posts; the builder namespace only
//! tells whether Elementor is active.

use std::fmt;

use tracing::{info, warn};

use crate::api::SiteApi;
use crate::error::WordPressError;
use crate::types::{BUILDER_NAMESPACE, CORE_NAMESPACE, CurrentUser};

/// Something [`check_site`] found wrong.
#[derive(Debug)]
pub enum SiteProblem {
    /// `/wp-json/` could not be fetched or parsed.
    RestUnavailable(WordPressError),
    /// The discovery index lacks `wp/v2`.
    CoreApiMissing,
    /// The discovery index lacks `elementor/v1`.
    BuilderApiMissing,
    /// `/wp/v2/users/me` failed.
    CredentialsRejected(WordPressError),
    /// The user lacks the `edit_posts` capability.
    CannotEditPosts,
}

impl SiteProblem {
    /// Whether the problem prevents synchronization.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::BuilderApiMissing)
    }

    /// What the operator should check.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::RestUnavailable(err) | Self::CredentialsRejected(err) => err.guidance(),
            Self::CoreApiMissing => {
                "The core REST API is disabled; check security plugins that restrict /wp-json."
            }
            Self::BuilderApiMissing => {
                "Elementor does not appear to be active; builder documents will not render."
            }
            Self::CannotEditPosts => "Give the user the Editor or Author role.",
        }
    }
}

impl fmt::Display for SiteProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestUnavailable(err) => write!(f, "REST API unavailable: {err}"),
            Self::CoreApiMissing => write!(f, "namespace {CORE_NAMESPACE} not registered"),
            Self::BuilderApiMissing => write!(f, "namespace {BUILDER_NAMESPACE} not registered"),
            Self::CredentialsRejected(err) => write!(f, "credentials rejected: {err}"),
            Self::CannotEditPosts => f.write_str("user cannot edit posts"),
        }
    }
}

/// Result of [`check_site`].
#[derive(Debug, Default)]
pub struct SiteReport {
    /// Site title from the discovery index.
    pub site_name: Option<String>,
    /// Registered REST namespaces.
    pub namespaces: Vec<String>,
    /// The authenticated user, if the credentials were accepted.
    pub user: Option<CurrentUser>,
    /// Problems found, in check order.
    pub problems: Vec<SiteProblem>,
}

impl SiteReport {
    /// Whether nothing prevents synchronization.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.problems.iter().any(SiteProblem::is_fatal)
    }
}

/// Check REST discovery, then the credentials.
///
/// The credentials are checked even when discovery fails, so one run
/// reports both.
pub fn check_site(api: &dyn SiteApi) -> SiteReport {
    let mut report = SiteReport::default();

    match api.discover() {
        Ok(index) => {
            if !index.has_namespace(CORE_NAMESPACE) {
                report.problems.push(SiteProblem::CoreApiMissing);
            }
            if !index.has_namespace(BUILDER_NAMESPACE) {
                report.problems.push(SiteProblem::BuilderApiMissing);
            }
            report.site_name = index.name;
            report.namespaces = index.namespaces;
        }
        Err(err) => report.problems.push(SiteProblem::RestUnavailable(err)),
    }

    match api.current_user() {
        Ok(user) => {
            if user.can_edit_posts() == Some(false) {
                report.problems.push(SiteProblem::CannotEditPosts);
            }
            report.user = Some(user);
        }
        Err(err) => report.problems.push(SiteProblem::CredentialsRejected(err)),
    }

    for problem in &report.problems {
        warn!(%problem, "Site check");
    }
    info!(ready = report.is_ready(), problems = report.problems.len(), "Site checked");
    report
}
