//! Configuration for a VaultGuard deployment.

use serde::{Deserialize, Serialize};

use crate::{GuardError, Identity, ProgramId, Result, constants};

/// How the Replay Guard treats nonces inside one `(account, action)` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceMode {
    /// Any unused token id is accepted once.
    #[default]
    Unique,
    /// Additionally, each accepted nonce must exceed every earlier one.
    Monotonic,
}

/// Tracing output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

/// Guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Reward points per elapsed second.
    pub reward_rate_per_sec: u64,
    /// Upper bound on `expires_at - issued_at` for authorization tokens.
    pub max_token_lifetime_secs: u64,
    pub nonce_mode: NonceMode,
    /// Delegated-call allow-list.
    pub trusted_programs: Vec<ProgramId>,
    /// Identities besides the current owner that may hold an account after
    /// a delegated call returns.
    pub trusted_authorities: Vec<Identity>,
    pub logging: LoggingConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            reward_rate_per_sec: constants::DEFAULT_REWARD_RATE_PER_SEC,
            max_token_lifetime_secs: constants::DEFAULT_MAX_TOKEN_LIFETIME_SECS,
            nonce_mode: NonceMode::default(),
            trusted_programs: Vec::new(),
            trusted_authorities: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GuardError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a guard meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.reward_rate_per_sec == 0 {
            return Err(GuardError::Configuration(
                "reward_rate_per_sec must be > 0".into(),
            ));
        }
        if self.max_token_lifetime_secs == 0 {
            return Err(GuardError::Configuration(
                "max_token_lifetime_secs must be > 0".into(),
            ));
        }
        if i64::try_from(self.max_token_lifetime_secs).is_err() {
            return Err(GuardError::Configuration(
                "max_token_lifetime_secs out of range".into(),
            ));
        }
        Ok(())
    }

    /// `max_token_lifetime_secs` as a duration.
    #[must_use]
    pub fn max_token_lifetime(&self) -> chrono::Duration {
        let secs = i64::try_from(self.max_token_lifetime_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}
