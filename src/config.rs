//! Command line and environment configuration of the client.

use clap::Args;
use reqwest::Url;

use crate::{
    Error,
    models::{EntityId, User},
};

/// Where the server lives and who is using it.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// The URL of the finance server, e.g. `http://localhost:8000`.
    #[arg(long, env = "LEDGERLINE_BASE_URL")]
    pub base_url: String,

    /// The ID of the current user.
    #[arg(long, env = "LEDGERLINE_USER_ID")]
    pub user_id: String,

    /// The name of the current user.
    #[arg(long, env = "LEDGERLINE_USER_NAME")]
    pub user_name: String,
}

impl Config {
    /// Validate the arguments.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if the base URL is not an HTTP(S) URL.
    pub fn to_client_config(&self) -> Result<ClientConfig, Error> {
        ClientConfig::new(
            &self.base_url,
            User {
                id: EntityId::new(self.user_id.as_str()),
                name: self.user_name.clone(),
            },
        )
    }
}

/// The validated configuration the controllers are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    user: User,
}

impl ClientConfig {
    /// Check that `base_url` is an absolute HTTP(S) URL.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if it is not.
    pub fn new(base_url: &str, user: User) -> Result<Self, Error> {
        let url = Url::parse(base_url)
            .map_err(|error| Error::InvalidConfig(format!("base URL \"{base_url}\": {error}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base URL \"{base_url}\" must use http or https"
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            user,
        })
    }

    /// The server URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The current user.
    pub fn user(&self) -> &User {
        &self.user
    }
}
