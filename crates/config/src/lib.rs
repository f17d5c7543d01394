//! Layered configuration for the billkit service.
//!
//! Configuration is assembled once at process start from three layers,
//! later layers overriding earlier ones:
//!
//! 1. compiled-in defaults ([`AppConfig::default`]),
//! 2. an optional `billkit.toml` in the working directory,
//! 3. environment variables prefixed with `BILLKIT_`, using `__` as the
//!    section separator (e.g. `BILLKIT_BRANDING__NAME`,
//!    `BILLKIT_SERVER__PORT`).
//!
//! The resulting [`AppConfig`] is immutable and passed by reference into
//! the renderer and the delivery adapter; a missing field maps to its
//! documented default at construction time, never at use time.

pub mod error;

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file consulted next to the working directory.
pub const CONFIG_FILE: &str = "billkit.toml";
/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "BILLKIT_";

/// Top-level service configuration, constructed once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub branding: Branding,
    pub smtp: SmtpConfig,
    pub chrome: ChromeConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Loads configuration from defaults, `billkit.toml`, and the
    /// environment, in that order of precedence.
    pub fn load() -> Result<Self> {
        let config = Self::from_figment(Self::figment())?;
        tracing::debug!(port = config.server.port, "configuration loaded");
        Ok(config)
    }

    /// The figment underlying [`load`](Self::load), exposed so tests can
    /// extend or replace providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts an [`AppConfig`] from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        match figment.extract() {
            Ok(config) => Ok(config),
            Err(err) => exn::bail!(ErrorKind::Invalid(err.to_string())),
        }
    }
}

/// HTTP listener settings and the externally reachable base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL advertised in download links and static-file URLs.
    /// Falls back to `http://localhost:<port>` when unset.
    pub public_url: Option<String>,
}

impl ServerConfig {
    /// The advertised base URL, without a trailing slash.
    pub fn public_base(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3001, public_url: None }
    }
}

/// Company identity applied uniformly to every rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Branding {
    /// Returns a copy with the company name replaced, leaving every other
    /// field untouched. Used for the per-request `moduleName` override.
    pub fn with_company(&self, name: Option<&str>) -> Self {
        let mut branding = self.clone();
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            branding.name = name.to_string();
        }
        branding
    }
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "KETHU GROUPS".to_string(),
            tagline: "Second to None – Serving You the Best Way".to_string(),
            address: "P.O. Box 2069, Area 7, Lilongwe".to_string(),
            phone: "+265 888 921 085".to_string(),
            email: "kethugroups@hotmail.com".to_string(),
        }
    }
}

/// SMTP relay settings for the delivery adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_name: String,
    /// Sender address; falls back to `username` when unset.
    pub from_email: Option<String>,
}

impl SmtpConfig {
    /// The effective sender address, if any is configured.
    pub fn sender(&self) -> Option<&str> {
        self.from_email.as_deref().or(self.username.as_deref())
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp-mail.outlook.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from_name: "Kethu Groups".to_string(),
            from_email: None,
        }
    }
}

/// Headless-browser provisioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Directory where on-demand chromium installs are kept. Persistent
    /// across restarts so repeated resolutions stay cheap.
    pub cache_dir: PathBuf,
    /// Explicit path to a browser executable, consulted before any other
    /// resolution strategy.
    pub executable: Option<PathBuf>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self { cache_dir: default_cache_dir(), executable: None }
    }
}

/// Static-file output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where generated PDFs are persisted and served from.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("./static") }
    }
}

/// Platform cache directory for chromium installs, with a temp-dir
/// fallback for environments without a home directory (containers).
pub fn default_cache_dir() -> PathBuf {
    match directories::ProjectDirs::from("", "", "billkit") {
        Some(dirs) => dirs.cache_dir().join("chromium"),
        None => std::env::temp_dir().join("billkit-chromium"),
    }
}
