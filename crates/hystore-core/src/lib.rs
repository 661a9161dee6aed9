//! HyStore Core Library
//!
//! Aggregates sideloading repositories into one browsable app catalog and
//! news feed, and hands selected apps off to an install client.

pub mod catalog;
pub mod config;
pub mod context;
pub mod install;
pub mod localize;
pub mod news;
pub mod registry;
pub mod service;
pub mod source;
pub mod state;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{HyStoreConfig, NetworkConfig, RepositoriesConfig};
    pub use crate::context::AppContext;

    // Repositories
    pub use crate::registry::{
        DEFAULT_REPOSITORIES, RegistryEvent, RegistryReport, RepoRegistry, Subscription,
    };
    pub use crate::state::{JsonFileStore, KeyValueStore};

    // Catalog
    pub use crate::catalog::{CatalogAggregator, SearchSortView, SortOption};
    pub use crate::news::{NewsAggregator, NewsLink};
    pub use crate::service::{Lookup, Snapshot, StoreService};
    pub use crate::source::{
        AppRecord, HttpFetcher, NewsItem, Screenshot, SourceDocument, SourceFetcher, VersionInfo,
    };

    // Install
    pub use crate::install::{
        DispatchError, Handoff, InstallDispatcher, InstallMethod, Navigator, PreferenceStore,
        SystemOpener,
    };
}
