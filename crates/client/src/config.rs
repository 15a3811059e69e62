//! Client configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use unizwap_circuits::TREE_DEPTH;

use crate::error::PrivacyError;

/// Roots the hook contracts keep accepting after they rotate out.
pub const DEFAULT_ROOT_HISTORY: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Depth of the anonymity-set tree; must match the circuit keys.
    pub tree_depth: usize,
    /// Size of the ledger's accepted-root ring buffer.
    pub root_history_size: usize,
    /// First ledger height scanned for leaf insertions (hook deployment).
    pub start_height: u64,
    /// Extra attempts for transient ledger reads.
    pub fetch_retries: u32,
    /// Base delay between read retries; grows linearly per attempt.
    pub retry_backoff_ms: u64,
    /// Directory holding `<circuit>.pk` / `<circuit>.vk`.
    pub keys_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tree_depth: TREE_DEPTH,
            root_history_size: DEFAULT_ROOT_HISTORY,
            start_height: 0,
            fetch_retries: 3,
            retry_backoff_ms: 250,
            keys_dir: PathBuf::from("keys"),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `UNIZWAP_*` environment variables.
    pub fn from_env() -> Result<Self, PrivacyError> {
        let defaults = Self::default();
        let config = Self {
            tree_depth: env_or("UNIZWAP_TREE_DEPTH", defaults.tree_depth)?,
            root_history_size: env_or("UNIZWAP_ROOT_HISTORY", defaults.root_history_size)?,
            start_height: env_or("UNIZWAP_START_HEIGHT", defaults.start_height)?,
            fetch_retries: env_or("UNIZWAP_FETCH_RETRIES", defaults.fetch_retries)?,
            retry_backoff_ms: env_or("UNIZWAP_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            keys_dir: env::var("UNIZWAP_KEYS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.keys_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PrivacyError> {
        if self.tree_depth == 0 || self.tree_depth > 32 {
            return Err(PrivacyError::input(format!(
                "tree depth {} outside 1..=32",
                self.tree_depth
            )));
        }
        if self.root_history_size == 0 {
            return Err(PrivacyError::input("root history size must be non-zero"));
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, PrivacyError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PrivacyError::input(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
