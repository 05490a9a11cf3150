//! Configuration loading from `.env` files.

use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

/// Feed refresh cadence used when `POLL_INTERVAL_SECS` is absent.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings derived from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for all storage.
    pub store_root: PathBuf,
    /// HTTP bind address, e.g. `127.0.0.1:7070`.
    pub bind_http: String,
    /// Secret used to mint and verify `x-auth-token` credentials.
    pub auth_secret: String,
    /// Base URL the feed client polls; derived from `BIND_HTTP` when unset.
    pub api_url: String,
    /// Feed refresh interval.
    pub poll_interval: Duration,
}

impl Settings {
    /// Load settings from the specified `.env` file.
    pub fn from_env(path: &str) -> Result<Self> {
        dotenvy::from_filename(path).context("reading env file")?;
        let store_root = PathBuf::from(env::var("STORE_ROOT")?);
        let bind_http = env::var("BIND_HTTP")?;
        let auth_secret = env::var("AUTH_SECRET")?;
        let api_url = env::var("API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("http://{bind_http}"));
        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        Ok(Self {
            store_root,
            bind_http,
            auth_secret,
            api_url,
            poll_interval,
        })
    }
}

/// Environment variables consumed by [`Settings::from_env`]. Tests clear
/// these so a developer's shell cannot leak into assertions.
#[cfg(test)]
pub(crate) const ENV_VARS: [&str; 5] = [
    "STORE_ROOT",
    "BIND_HTTP",
    "AUTH_SECRET",
    "API_URL",
    "POLL_INTERVAL_SECS",
];

/// Serializes test access to the process environment.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
