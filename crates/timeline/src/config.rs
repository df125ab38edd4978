//! Crawler configuration.
//!
//! Values resolve as environment > JSON file > defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crawl::{Jitter, MAX_JITTER};
use crate::error::{CrawlError, Result};
use crate::twitter::TimelineEndpoint;
use crate::validate::ValidationRules;

/// Default hourly request ceiling.
pub const DEFAULT_REQUESTS_PER_HOUR: u32 = 400;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default jitter bounds in seconds.
pub const DEFAULT_JITTER_MIN_SECS: f64 = 1.0;
pub const DEFAULT_JITTER_MAX_SECS: f64 = 3.0;

/// Default pause after an upstream 429, in seconds.
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Default number of unique posts to collect per run.
pub const DEFAULT_DAILY_TWEET_COUNT: usize = 100;

/// Request pacing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Hourly request ceiling; 0 disables it.
    pub requests_per_hour: u32,
    /// Per-request timeout in seconds.
    #[serde(alias = "timeout")]
    pub timeout_secs: u64,
    /// Lower jitter bound in seconds.
    pub jitter_min_secs: f64,
    /// Upper jitter bound in seconds.
    pub jitter_max_secs: f64,
    /// Pause after an upstream 429, in seconds.
    pub cooldown_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            requests_per_hour: DEFAULT_REQUESTS_PER_HOUR,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            jitter_min_secs: DEFAULT_JITTER_MIN_SECS,
            jitter_max_secs: DEFAULT_JITTER_MAX_SECS,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl CrawlSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    #[must_use]
    pub fn jitter(&self) -> Jitter {
        Jitter::new(self.jitter_min_secs, self.jitter_max_secs)
    }
}

/// What a run collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlTargets {
    /// Unique posts to collect before stopping.
    pub daily_tweet_count: usize,
    /// Optional ceiling on fetched pages.
    pub max_pages: Option<usize>,
    /// Timeline to crawl.
    pub timeline: TimelineEndpoint,
}

impl Default for CrawlTargets {
    fn default() -> Self {
        Self {
            daily_tweet_count: DEFAULT_DAILY_TWEET_COUNT,
            max_pages: None,
            timeline: TimelineEndpoint::default(),
        }
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxySettings {
    /// Proxy URL to use, preferring the https entry.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.https
            .as_deref()
            .or(self.http.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Complete crawler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub settings: CrawlSettings,
    pub targets: CrawlTargets,
    pub proxy: ProxySettings,
    pub validation: ValidationRules,
}

impl CrawlerConfig {
    /// Load configuration from an optional JSON file, then apply environment overrides.
    ///
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content).map_err(|e| {
                    CrawlError::config(format!("invalid config file {}: {e}", path.display()))
                })?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables over defaults.
    ///
    /// # Optional Environment Variables
    /// - `REQUESTS_PER_HOUR`: Hourly request ceiling (default: 400)
    /// - `TIMEOUT`: Request timeout in seconds (default: 30)
    /// - `DAILY_TWEET_COUNT`: Unique posts per run (default: 100)
    /// - `HTTPS_PROXY` / `HTTP_PROXY`: Outbound proxy
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            let value = raw.trim().parse().ok();
            if value.is_none() {
                tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            }
            value
        }

        if let Some(v) = parsed("REQUESTS_PER_HOUR", lookup("REQUESTS_PER_HOUR")) {
            self.settings.requests_per_hour = v;
        }
        if let Some(v) = parsed("TIMEOUT", lookup("TIMEOUT")) {
            self.settings.timeout_secs = v;
        }
        if let Some(v) = parsed("DAILY_TWEET_COUNT", lookup("DAILY_TWEET_COUNT")) {
            self.targets.daily_tweet_count = v;
        }
        if let Some(v) = lookup("HTTP_PROXY").filter(|v| !v.is_empty()) {
            self.proxy.http = Some(v);
        }
        if let Some(v) = lookup("HTTPS_PROXY").filter(|v| !v.is_empty()) {
            self.proxy.https = Some(v);
        }
    }

    /// Reject settings the crawler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout_secs == 0 {
            return Err(CrawlError::config("timeout must be greater than zero"));
        }
        let max_jitter = MAX_JITTER.as_secs_f64();
        for (name, value) in [
            ("jitter_min_secs", self.settings.jitter_min_secs),
            ("jitter_max_secs", self.settings.jitter_max_secs),
        ] {
            if !value.is_finite() || value < 0.0 || value > max_jitter {
                return Err(CrawlError::config(format!(
                    "{name} must be between 0 and {max_jitter} seconds, got {value}"
                )));
            }
        }
        if self.settings.jitter_min_secs > self.settings.jitter_max_secs {
            return Err(CrawlError::config(format!(
                "jitter_min_secs ({}) exceeds jitter_max_secs ({})",
                self.settings.jitter_min_secs, self.settings.jitter_max_secs
            )));
        }
        if self.targets.max_pages == Some(0) {
            return Err(CrawlError::config("max_pages must be at least 1"));
        }
        Ok(())
    }
}
