//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Keychain service name holding the chat admin token.
const KEYRING_SERVICE: &str = "rocketchat-tab";

/// Environment variable overriding `chat.base_url`.
pub const BASE_URL_ENV: &str = "CHAT_BASE_URL";
/// Environment variable overriding `chat.admin_user_id`.
pub const ADMIN_USER_ID_ENV: &str = "CHAT_ADMIN_USER_ID";
/// Environment variable supplying the admin token.
pub const ADMIN_TOKEN_ENV: &str = "CHAT_ADMIN_TOKEN";

/// Chat server connectivity settings.
///
/// The admin token is loaded at runtime via OS keychain or environment
/// variables, not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ChatConfig {
    /// Root URL of the chat server, stored without a trailing slash.
    pub base_url: String,
    /// Id of the admin account the API calls are made as.
    pub admin_user_id: String,
    /// Personal access token of the admin account (populated at runtime).
    #[serde(skip)]
    pub admin_token: String,
    /// Prefix prepended to every course room name.
    #[serde(default = "default_room_prefix")]
    pub room_prefix: String,
    /// Upper bound for a single chat API call.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl ChatConfig {
    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_room_prefix() -> String {
    "edx".into()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_http_port() -> u16 {
    8085
}

/// Settings for the HTTP service the host platform calls into.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServiceConfig {
    /// Loopback port the launch endpoint listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
        }
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Chat server connectivity settings.
    pub chat: ChatConfig,
    /// HTTP service settings.
    #[serde(default)]
    pub service: ServiceConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize the base URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply deployment overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an overridden value fails validation.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply deployment overrides using `lookup` to resolve variables.
    ///
    /// `CHAT_BASE_URL` and `CHAT_ADMIN_USER_ID` replace their file values;
    /// `CHAT_ADMIN_TOKEN` sets the token. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an overridden value fails validation.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = non_empty(BASE_URL_ENV) {
            info!(key = BASE_URL_ENV, "chat base url overridden from environment");
            self.chat.base_url = base_url;
        }
        if let Some(user_id) = non_empty(ADMIN_USER_ID_ENV) {
            info!(key = ADMIN_USER_ID_ENV, "admin user id overridden from environment");
            self.chat.admin_user_id = user_id;
        }
        if let Some(token) = non_empty(ADMIN_TOKEN_ENV) {
            self.chat.admin_token = token;
        }

        self.validate()
    }

    /// Load the chat admin token from OS keychain with env-var fallback.
    ///
    /// A token already set through [`Self::apply_env_overrides`] is kept.
    /// Otherwise the `rocketchat-tab` keyring service is tried first, then
    /// the `CHAT_ADMIN_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env var provides
    /// the token.
    pub async fn load_credentials(&mut self) -> Result<()> {
        if self.chat.admin_token.is_empty() {
            self.chat.admin_token = load_credential("chat_admin_token", ADMIN_TOKEN_ENV).await?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        let trimmed = self.chat.base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|err| AppError::Config(format!("chat.base_url invalid: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(
                "chat.base_url must use http or https".into(),
            ));
        }
        self.chat.base_url = trimmed.to_owned();

        if self.chat.admin_user_id.trim().is_empty() {
            return Err(AppError::Config(
                "chat.admin_user_id must not be empty".into(),
            ));
        }

        if self.chat.room_prefix.trim().is_empty() {
            return Err(AppError::Config("chat.room_prefix must not be empty".into()));
        }

        if self.chat.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "chat.request_timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "credential {keyring_key} not found in keychain or {env_key} env var"
            ))
        })
}
