//! Catalog aggregation
//!
//! Merges the `apps` arrays of every registered repository into one ordered
//! catalog. The order is repository-list order, then array order within each
//! repository; that order is what "default" sorting restores.

pub mod view;

use std::sync::Arc;

use crate::source::{self, AppRecord, FetchedSource, SourceDocument, SourceFetcher};

pub use view::{SearchSortView, SortOption, filter, sort};

/// Builds the merged catalog from a set of repository URLs
#[derive(Debug)]
pub struct CatalogAggregator<F> {
    fetcher: Arc<F>,
}

impl<F> Clone for CatalogAggregator<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<F: SourceFetcher> CatalogAggregator<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// Fetch every repository and concatenate their apps.
    ///
    /// Never fails: an unreachable or malformed repository contributes
    /// nothing. The same bundle identifier listed by two repositories yields
    /// two records.
    pub async fn aggregate(&self, urls: &[String]) -> Vec<AppRecord> {
        let fetched = source::fetch_all(&self.fetcher, urls).await;
        merge_catalog(&fetched)
    }

    /// Look up one app directly in its repository.
    ///
    /// Returns `None` when the repository cannot be loaded or does not list
    /// `bundle_identifier`.
    pub async fn find_in_source(
        &self,
        source_url: &str,
        bundle_identifier: &str,
    ) -> Option<AppRecord> {
        let document = source::fetch_one(self.fetcher.as_ref(), source_url).await?;
        records_from_document(&document, source_url)
            .into_iter()
            .find(|app| app.bundle_identifier == bundle_identifier)
    }
}

/// Concatenate the apps of already fetched repositories in canonical order.
pub fn merge_catalog(sources: &[FetchedSource]) -> Vec<AppRecord> {
    let catalog: Vec<AppRecord> = sources
        .iter()
        .filter_map(|fetched| {
            let document = fetched.document.as_ref()?;
            Some(records_from_document(document, &fetched.url))
        })
        .flatten()
        .collect();

    tracing::debug!(
        "Aggregated {} apps from {} repositories",
        catalog.len(),
        sources.len()
    );
    catalog
}

/// Decode a document's apps and tag each with the repository it came from.
pub fn records_from_document(document: &SourceDocument, source_url: &str) -> Vec<AppRecord> {
    let Some(entries) = document.apps.as_deref() else {
        tracing::warn!("Repository {source_url} has no apps array");
        return Vec::new();
    };

    let source_name = document.display_name();
    source::decode_entries::<AppRecord>(entries, "app", source_url)
        .into_iter()
        .map(|mut app| {
            app.source_name = source_name.to_string();
            app.source_url = source_url.to_string();
            app
        })
        .collect()
}

/// Find an app by its display identity within an aggregated catalog.
pub fn find<'a>(
    catalog: &'a [AppRecord],
    bundle_identifier: &str,
    source_url: &str,
) -> Option<&'a AppRecord> {
    catalog
        .iter()
        .find(|app| app.key() == (bundle_identifier, source_url))
}
