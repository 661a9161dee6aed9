//! Repository registry
//!
//! The ordered, persisted list of repository URLs that the catalog is
//! aggregated from. Every committed mutation is written to the state store
//! first and only then broadcast to subscribers, so a listener that re-reads
//! the registry always observes the new list.

mod observer;

use std::sync::Arc;

use anyhow::Context;

use crate::state::{CUSTOM_REPOS_KEY, KeyValueStore};

pub use observer::{RegistryEvent, Subscription};
use observer::Listeners;

/// Repositories seeded on first run
pub const DEFAULT_REPOSITORIES: &[&str] = &[
    "https://community-apps.sidestore.io/sidecommunity.json",
    "https://corsproxy.io/?https%3A%2F%2Fraw.githubusercontent.com%2FBalackburn%2FYTLitePlusAltstore%2Fmain%2Fapps.json",
    "https://tiny.one/SpotC",
    "https://repo.apptesters.org",
    "https://randomblock1.com/altstore/apps.json",
    "https://qnblackcat.github.io/AltStore/apps.json",
    "https://corsproxy.io/?https://esign.yyyue.xyz/app.json",
    "https://corsproxy.io/?https://wuxu1.github.io/wuxu-complete-plus.json",
    "https://corsproxy.io/?https%3A%2F%2Fwuxu1.github.io%2Fwuxu-complete.json",
    "https://raw.githubusercontent.com/vizunchik/AltStoreRus/master/apps.json",
    "https://quarksources.github.io/dist/quantumsource.min.json",
    "https://corsproxy.io/?https%3A%2F%2Fipa.cypwn.xyz%2Fcypwn.json",
];

/// Result of a registry mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReport {
    /// Repository list after the operation
    pub repositories: Vec<String>,
    /// Whether the list content changed
    pub changed: bool,
}

/// Persisted ordered list of repository URLs
pub struct RepoRegistry {
    store: Arc<dyn KeyValueStore>,
    defaults: Arc<[String]>,
    listeners: Listeners,
}

impl std::fmt::Debug for RepoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoRegistry")
            .field("defaults", &self.defaults)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl RepoRegistry {
    /// Create a registry over `store`, seeding from `defaults` on first use.
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: Vec<String>) -> Self {
        Self {
            store,
            defaults: defaults.into(),
            listeners: Listeners::default(),
        }
    }

    /// Create a registry seeded from [`DEFAULT_REPOSITORIES`].
    pub fn with_builtin_defaults(store: Arc<dyn KeyValueStore>) -> Self {
        let defaults = DEFAULT_REPOSITORIES.iter().map(|s| s.to_string()).collect();
        Self::new(store, defaults)
    }

    /// The default set this registry seeds and resets to
    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// Read the repository list.
    ///
    /// The first call on a store that has never held a list writes and
    /// returns the default set. Later calls never re-seed, even when the user
    /// has emptied the list. Unreadable state yields an empty list.
    pub fn load(&self) -> Vec<String> {
        match self.read() {
            Ok(Some(repos)) => repos,
            Ok(None) => {
                let defaults = self.defaults.to_vec();
                if let Err(err) = self.write(&defaults) {
                    tracing::warn!("Failed to seed default repositories: {err:#}");
                } else {
                    tracing::info!("Seeded {} default repositories", defaults.len());
                }
                defaults
            }
            Err(err) => {
                tracing::warn!("Failed to read repository list: {err:#}");
                Vec::new()
            }
        }
    }

    /// Append a repository URL.
    ///
    /// Surrounding whitespace is trimmed; a blank URL is a no-op that neither
    /// writes nor notifies. Duplicates are kept.
    pub fn add(&self, url: &str) -> anyhow::Result<RegistryReport> {
        let url = url.trim();
        if url.is_empty() {
            let repositories = match self.read() {
                Ok(repos) => repos.unwrap_or_else(|| self.defaults.to_vec()),
                Err(_) => Vec::new(),
            };
            return Ok(RegistryReport {
                repositories,
                changed: false,
            });
        }

        let mut repositories = self.read_for_update()?;
        repositories.push(url.to_string());
        self.commit(&repositories)
            .with_context(|| format!("Failed to add repository '{}'", url))?;
        tracing::info!("Added repository: {url}");

        Ok(RegistryReport {
            repositories,
            changed: true,
        })
    }

    /// Remove every entry exactly equal to `url`.
    pub fn remove(&self, url: &str) -> anyhow::Result<RegistryReport> {
        let current = self.read_for_update()?;
        let before = current.len();
        let repositories: Vec<String> = current.into_iter().filter(|repo| repo != url).collect();
        let changed = repositories.len() != before;

        self.commit(&repositories)
            .with_context(|| format!("Failed to remove repository '{}'", url))?;
        tracing::info!("Removed repository: {url}");

        Ok(RegistryReport {
            repositories,
            changed,
        })
    }

    /// Replace the whole list with the default set.
    pub fn reset_to_default(&self) -> anyhow::Result<RegistryReport> {
        let previous = self.read().ok().flatten();
        let repositories = self.defaults.to_vec();

        self.commit(&repositories)
            .context("Failed to reset repositories to defaults")?;
        tracing::info!("Reset repositories to {} defaults", repositories.len());

        Ok(RegistryReport {
            changed: previous.as_ref() != Some(&repositories),
            repositories,
        })
    }

    /// Register a callback invoked synchronously after each committed mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(RegistryEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(callback))
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn read(&self) -> anyhow::Result<Option<Vec<String>>> {
        let raw = match self.store.get(CUSTOM_REPOS_KEY)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        // A stored `null` reads as an emptied list, not as "never seeded".
        let repos: Option<Vec<String>> =
            serde_json::from_str(&raw).context("Stored repository list is not valid JSON")?;
        Ok(Some(repos.unwrap_or_default()))
    }

    /// Mutations refuse to build on unreadable state so they never overwrite
    /// a list they could not see.
    fn read_for_update(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .read()
            .context("Failed to read repository list")?
            .unwrap_or_else(|| self.defaults.to_vec()))
    }

    fn write(&self, repositories: &[String]) -> anyhow::Result<()> {
        let encoded =
            serde_json::to_string(repositories).context("Failed to encode repository list")?;
        self.store.set(CUSTOM_REPOS_KEY, &encoded)
    }

    fn commit(&self, repositories: &[String]) -> anyhow::Result<()> {
        self.write(repositories)?;
        self.listeners.emit(RegistryEvent::ReposChanged);
        Ok(())
    }
}
