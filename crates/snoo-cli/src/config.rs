//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use snoo_api::{ClientOptions, Credentials, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// SNOO login username.
    pub username: Option<String>,
    /// SNOO login password.
    pub password: Option<String>,
    /// API host, including scheme.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SNOO_*)
        figment = figment.merge(Env::prefixed("SNOO_"));

        figment.extract()
    }

    /// Applies values given on the command line, which win over everything else.
    #[must_use]
    pub fn with_overrides(mut self, username: Option<String>, password: Option<String>) -> Self {
        if username.is_some() {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
        self
    }

    /// Login credentials, failing if either half is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        let username = non_empty(self.username.as_deref()).ok_or_else(|| {
            anyhow!("missing SNOO username (set SNOO_USERNAME, --username or config.toml)")
        })?;
        let password = non_empty(self.password.as_deref()).ok_or_else(|| {
            anyhow!("missing SNOO password (set SNOO_PASSWORD, --password or config.toml)")
        })?;
        Ok(Credentials::new(username, password))
    }

    /// Connection settings for the API client. A zero timeout is rejected,
    /// since it would fail every request.
    pub fn client_options(&self) -> Result<ClientOptions> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1 (check SNOO_TIMEOUT_SECS or config.toml)");
        }
        Ok(ClientOptions {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Returns the platform-specific config directory for snoo.
///
/// On Linux: `~/.config/snoo`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("snoo"))
}
