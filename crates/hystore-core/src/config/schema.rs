//! hystore.toml configuration schema

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level hystore.toml structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyStoreConfig {
    /// HTTP client settings used when fetching repositories
    #[serde(default)]
    pub network: NetworkConfig,

    /// Repository list settings
    #[serde(default)]
    pub repositories: RepositoriesConfig,
}

/// `[network]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("hystore/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[repositories]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoriesConfig {
    /// Replaces the built-in default repository set when present
    #[serde(default)]
    pub defaults: Option<Vec<String>>,
}

impl HyStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values that serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.network.timeout_secs == 0 {
            anyhow::bail!("network.timeout_secs must be greater than zero");
        }
        if self.network.user_agent.trim().is_empty() {
            anyhow::bail!("network.user_agent must not be empty");
        }
        if let Some(defaults) = &self.repositories.defaults {
            for url in defaults {
                if url.trim().is_empty() {
                    anyhow::bail!("repositories.defaults contains a blank entry");
                }
            }
        }
        Ok(())
    }

    /// Default repository set: the configured override or the built-in list
    pub fn default_repositories(&self) -> Vec<String> {
        match &self.repositories.defaults {
            Some(defaults) => defaults.clone(),
            None => crate::registry::DEFAULT_REPOSITORIES
                .iter()
                .map(|url| url.to_string())
                .collect(),
        }
    }
}
