//! CLI error types.

use wpsync_config::ConfigError;
use wpsync_elementor::DocumentError;
use wpsync_wordpress::{Diagnosis, RevisionRecord, SyncError, WordPressError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("{0}")]
    WordPress(#[from] WordPressError),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),
}

impl CliError {
    /// Operator guidance for failures that have one.
    pub(crate) fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::Sync(err) => Some(err.guidance()),
            Self::WordPress(err) => Some(err.guidance()),
            _ => None,
        }
    }

    /// Newest revision seen when a write failed verification.
    pub(crate) fn latest_revision(&self) -> Option<&RevisionRecord> {
        match self {
            Self::Sync(SyncError::VerificationMismatch {
                latest_revision, ..
            }) => latest_revision.as_ref(),
            _ => None,
        }
    }

    /// Whether the site has to register the builder meta fields first.
    pub(crate) fn needs_meta_registration(&self) -> bool {
        matches!(
            self,
            Self::Sync(
                SyncError::MetaNotExposed { .. }
                    | SyncError::VerificationMismatch {
                        diagnosis: Diagnosis::MetaNotExposed | Diagnosis::MetaNotWritable,
                        ..
                    }
            )
        )
    }
}
