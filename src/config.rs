use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for the fallback proof lifetime.
pub const MAX_PROOF_TTL_SECS: u64 = 24 * 60 * 60;

/// Client configuration.
///
/// Resolution order: defaults, then the JSON file (if any), then
/// `FIELDFORCE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub tracking_interval_secs: u64,
    /// Lifetime given to a proof session when the backend omits an expiry.
    pub proof_ttl_secs: u64,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            tracking_interval_secs: 60,
            proof_ttl_secs: 300,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Self::default()
        };

        let config = config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        let config = Self::default().apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("FIELDFORCE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = lookup("FIELDFORCE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) =
            lookup("FIELDFORCE_TRACKING_INTERVAL_SECS").and_then(|v| v.parse().ok())
        {
            self.tracking_interval_secs = secs;
        }
        if let Some(secs) = lookup("FIELDFORCE_PROOF_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.proof_ttl_secs = secs;
        }

        let debug_mode = lookup("FIELDFORCE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.log_level = "debug".to_string();
            self.tracking_interval_secs = 5;
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.tracking_interval_secs == 0 {
            bail!("tracking_interval_secs must be greater than zero");
        }
        if self.proof_ttl_secs == 0 {
            bail!("proof_ttl_secs must be greater than zero");
        }
        if self.proof_ttl_secs > MAX_PROOF_TTL_SECS {
            bail!("proof_ttl_secs must be at most {MAX_PROOF_TTL_SECS}");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tracking_interval(&self) -> Duration {
        Duration::from_secs(self.tracking_interval_secs)
    }

    /// Clamped to `MAX_PROOF_TTL_SECS`, so an unvalidated value cannot overflow.
    pub fn proof_ttl(&self) -> chrono::Duration {
        let secs = self.proof_ttl_secs.min(MAX_PROOF_TTL_SECS) as i64;
        chrono::TimeDelta::try_seconds(secs).unwrap_or_else(chrono::TimeDelta::zero)
    }
}
