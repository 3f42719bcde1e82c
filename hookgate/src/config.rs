use hookgate_types::PermissionDecision;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::hooks::DEFAULT_TIMEOUT_MS;

/// Error loading engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Environment variable that held the bad value
    pub key: String,
    pub message: String,
}

impl ConfigError {
    fn invalid(key: &str, message: String) -> Self {
        Self {
            key: key.to_string(),
            message,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid hook configuration for {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookEngineConfig {
    /// Budget for groups that don't set their own timeout
    pub default_timeout_ms: u64,
    /// Decision when no hook expresses one
    pub default_decision: PermissionDecision,
}

impl Default for HookEngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_decision: PermissionDecision::Allow,
        }
    }
}

impl HookEngineConfig {
    /// Load from the environment, falling back to defaults on malformed values
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            log::warn!("[CONFIG] {}, using defaults", e);
            Self::default()
        })
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("HOOKS_DEFAULT_TIMEOUT_MS") {
            config.default_timeout_ms = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(
                    "HOOKS_DEFAULT_TIMEOUT_MS",
                    format!("expected a number of milliseconds, got '{}'", raw),
                )
            })?;
        }

        if let Some(raw) = lookup("HOOKS_DEFAULT_DECISION") {
            config.default_decision = PermissionDecision::parse(&raw).ok_or_else(|| {
                ConfigError::invalid(
                    "HOOKS_DEFAULT_DECISION",
                    format!("expected allow, deny or ask, got '{}'", raw),
                )
            })?;
        }

        Ok(config)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
