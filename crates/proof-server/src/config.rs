//! Server configuration from `UNIZWAP_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use unizwap_circuits::TREE_DEPTH;
use unizwap_client::{ClientConfig, PrivacyError};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub keys_dir: PathBuf,
    pub tree_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            keys_dir: PathBuf::from("keys"),
            tree_depth: TREE_DEPTH,
        }
    }
}

impl ServerConfig {
    /// Tree depth and keys directory come from the client settings, so the
    /// same variables and bounds apply to both.
    pub fn from_env() -> Result<Self, PrivacyError> {
        let client = ClientConfig::from_env()?;
        let mut config = Self {
            keys_dir: client.keys_dir,
            tree_depth: client.tree_depth,
            ..Self::default()
        };
        if let Ok(bind) = env::var("UNIZWAP_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| PrivacyError::input(format!("UNIZWAP_BIND {:?}: {}", bind, e)))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PrivacyError> {
        ClientConfig {
            tree_depth: self.tree_depth,
            keys_dir: self.keys_dir.clone(),
            ..ClientConfig::default()
        }
        .validate()
    }
}
