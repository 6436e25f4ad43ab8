//! Site discovery and user lookup.

use tracing::info;

use super::WordPressClient;
use crate::api::SiteApi;
use crate::error::WordPressError;
use crate::types::{CurrentUser, SiteIndex};

impl SiteApi for WordPressClient {
    fn discover(&self) -> Result<SiteIndex, WordPressError> {
        let url = self.rest_url("");
        info!(url = %url, "Discovering REST API");

        let body = self.get(&url)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn current_user(&self) -> Result<CurrentUser, WordPressError> {
        let url = self.rest_url("wp/v2/users/me?context=edit");
        info!("Fetching authenticated user");

        let body = self.get(&url)?;
        Ok(serde_json::from_str(&body)?)
    }
}
