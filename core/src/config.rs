//! Client configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional `speedrun.{toml,json,yaml}` file in the working directory, then
//! `SPEEDRUN_*` environment variables (nested keys use `__`, e.g.
//! `SPEEDRUN_RETRY__MAX_RETRIES=2`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://www.speedrun.com/api/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `X-API-Key` on every request when set.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

/// Retry schedule for idempotent requests.
///
/// The delay before retry `n` (1-based) is `backoff_factor * 2^(n-1)`
/// seconds, capped at `max_backoff_secs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub max_backoff_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
            user_agent: concat!("speedrun-core/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 0.1,
            max_backoff_secs: 120.0,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(30) as i32;
        let secs = (self.backoff_factor * 2f64.powi(exponent)).min(self.max_backoff_secs);
        // Delays too large for a `Duration` saturate instead of panicking.
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional `speedrun` config file
    /// and `SPEEDRUN_*` environment variables.
    pub fn load() -> Result<Self, ApiError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("speedrun").required(false))
            .add_source(
                config::Environment::with_prefix("SPEEDRUN")
                    .prefix_separator("_")
                    .separator("__"),
            );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ApiError> {
        let defaults = config::Config::try_from(&ClientConfig::default())?;
        // Defaults go first so every later source overrides them.
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(builder.build()?)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
