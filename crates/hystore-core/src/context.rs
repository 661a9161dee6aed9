//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{self, CONFIG_FILE_NAME, HyStoreConfig, STATE_FILE_NAME};
use crate::install::PreferenceStore;
use crate::registry::RepoRegistry;
use crate::service::StoreService;
use crate::source::HttpFetcher;
use crate::state::{JsonFileStore, KeyValueStore};

/// Unified application context for dependency injection.
///
/// Frontends create this once and build the services they need from it.
/// Every service built from the same context shares one state file and one
/// repository registry, so a subscriber sees mutations made through any of
/// them.
#[derive(Debug, Clone)]
pub struct AppContext {
    config_dir: PathBuf,
    config: HyStoreConfig,
    store: Arc<JsonFileStore>,
    registry: Arc<RepoRegistry>,
}

impl AppContext {
    /// Create a context rooted at the platform config directory.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config_dir(config::default_config_dir()?)
    }

    /// Create a context with a custom config directory (for testing).
    pub fn with_config_dir(config_dir: PathBuf) -> anyhow::Result<Self> {
        let config = config::load_config(&config_dir.join(CONFIG_FILE_NAME))?;
        Ok(Self::from_parts(config_dir, config))
    }

    /// Create a context from an already loaded configuration.
    pub fn from_parts(config_dir: PathBuf, config: HyStoreConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(config_dir.join(STATE_FILE_NAME)));
        let registry = Arc::new(RepoRegistry::new(
            store.clone(),
            config.default_repositories(),
        ));
        Self {
            config_dir,
            config,
            store,
            registry,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config(&self) -> &HyStoreConfig {
        &self.config
    }

    pub fn state_path(&self) -> &Path {
        self.store.path()
    }

    /// Shared persisted key/value state
    pub fn state_store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// The shared RepoRegistry, seeded from the configured defaults.
    pub fn registry(&self) -> Arc<RepoRegistry> {
        Arc::clone(&self.registry)
    }

    /// Get the install preference store.
    pub fn preferences(&self) -> PreferenceStore {
        PreferenceStore::new(self.state_store())
    }

    /// Get an HTTP fetcher using the network settings.
    pub fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
        HttpFetcher::new(&self.config.network)
    }

    /// Get a StoreService over the registry and the HTTP fetcher.
    pub fn service(&self) -> anyhow::Result<StoreService<HttpFetcher>> {
        Ok(StoreService::new(
            self.registry(),
            Arc::new(self.fetcher()?),
        ))
    }
}
