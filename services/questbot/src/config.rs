//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Only `[remote]` is required; every other section has defaults.

use serde::Deserialize;
use session::{DelayWindow, Limits};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runners::Settings;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

/// Remote service endpoint
#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Fixed Referer header the service expects
    pub referer: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Account file location
#[derive(Debug, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_accounts_path")]
    pub path: PathBuf,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            path: default_accounts_path(),
        }
    }
}

/// Attempt budgets and rate-limit waits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub credential_attempts: u32,
    pub task_attempts: u32,
    pub token_attempts: u32,
    pub lootbox_attempts: u32,
    pub identity_attempts: u32,
    pub rate_limit_fallback_secs: u64,
    pub max_rate_limit_wait_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            credential_attempts: 3,
            task_attempts: 3,
            token_attempts: 3,
            lootbox_attempts: 2,
            identity_attempts: 2,
            rate_limit_fallback_secs: 8,
            max_rate_limit_wait_secs: 120,
        }
    }
}

/// Delay windows between actions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub task_delay: DelayWindow,
    /// Pause after the first token of a pair
    pub short_pair_delay: DelayWindow,
    /// Pause after the second token of a pair
    pub long_pair_delay: DelayWindow,
    pub lootbox_delay: DelayWindow,
    /// Log every account's balance after each token cycle
    pub report_balances: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            task_delay: DelayWindow::new(4_000, 9_000),
            short_pair_delay: DelayWindow::new(300_000, 330_000),
            long_pair_delay: DelayWindow::new(3_600_000, 3_660_000),
            lootbox_delay: DelayWindow::new(8_000, 14_000),
            report_balances: true,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `QUESTBOT_ACCOUNTS` overrides `[accounts] path`.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| common::Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(accounts_path) = std::env::var("QUESTBOT_ACCOUNTS") {
            config.accounts.path = PathBuf::from(accounts_path);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            return Err(common::Error::invalid(
                "base_url",
                format!(
                    "must start with http:// or https://, got: {}",
                    self.remote.base_url
                ),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(common::Error::invalid(
                "timeout_secs",
                "must be greater than 0",
            ));
        }

        let limits = &self.limits;
        for (name, value) in [
            ("credential_attempts", limits.credential_attempts),
            ("task_attempts", limits.task_attempts),
            ("token_attempts", limits.token_attempts),
            ("lootbox_attempts", limits.lootbox_attempts),
            ("identity_attempts", limits.identity_attempts),
        ] {
            if value == 0 {
                return Err(common::Error::invalid(name, "must be greater than 0"));
            }
        }
        for (name, secs) in [
            ("rate_limit_fallback_secs", limits.rate_limit_fallback_secs),
            ("max_rate_limit_wait_secs", limits.max_rate_limit_wait_secs),
        ] {
            if secs == 0 {
                return Err(common::Error::invalid(name, "must be greater than 0"));
            }
        }

        let pacing = &self.pacing;
        for (name, window) in [
            ("task_delay", pacing.task_delay),
            ("short_pair_delay", pacing.short_pair_delay),
            ("long_pair_delay", pacing.long_pair_delay),
            ("lootbox_delay", pacing.lootbox_delay),
        ] {
            if !window.is_valid() {
                return Err(common::Error::invalid(
                    name,
                    format!(
                        "min_ms ({}) must not exceed max_ms ({})",
                        window.min_ms, window.max_ms
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Bounds for the credential guard and retry policy.
    pub fn session_limits(&self) -> Limits {
        Limits {
            credential_attempts: self.limits.credential_attempts,
            rate_limit_fallback: Duration::from_secs(self.limits.rate_limit_fallback_secs),
            max_rate_limit_wait: Duration::from_secs(self.limits.max_rate_limit_wait_secs),
        }
    }

    /// Per-mode budgets and pacing for the runners.
    pub fn runner_settings(&self) -> Settings {
        Settings {
            task_attempts: self.limits.task_attempts,
            token_attempts: self.limits.token_attempts,
            lootbox_attempts: self.limits.lootbox_attempts,
            identity_attempts: self.limits.identity_attempts,
            pacing: self.pacing.clone(),
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_path {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("questbot.toml")
    }
}
