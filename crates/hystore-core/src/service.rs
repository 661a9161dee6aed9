//! Store service
//!
//! Owns the most recent aggregation snapshot and keeps it in step with the
//! repository registry.

use std::sync::Arc;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;

use crate::catalog::{self, CatalogAggregator};
use crate::news;
use crate::registry::RepoRegistry;
use crate::source::{self, AppRecord, NewsItem, SourceFetcher};

/// One aggregation result. Both halves come from the same fetch pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub catalog: Arc<[AppRecord]>,
    pub news: Arc<[NewsItem]>,
}

/// Outcome of an app lookup by display identity
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(AppRecord),
    NotFound,
}

impl Lookup {
    pub fn found(self) -> Option<AppRecord> {
        match self {
            Lookup::Found(app) => Some(app),
            Lookup::NotFound => None,
        }
    }
}

impl From<Option<AppRecord>> for Lookup {
    fn from(app: Option<AppRecord>) -> Self {
        app.map_or(Lookup::NotFound, Lookup::Found)
    }
}

pub struct StoreService<F> {
    registry: Arc<RepoRegistry>,
    fetcher: Arc<F>,
    snapshot: RwLock<Snapshot>,
}

impl<F> std::fmt::Debug for StoreService<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<F: SourceFetcher> StoreService<F> {
    pub fn new(registry: Arc<RepoRegistry>, fetcher: Arc<F>) -> Self {
        Self {
            registry,
            fetcher,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn registry(&self) -> &Arc<RepoRegistry> {
        &self.registry
    }

    /// Aggregator sharing this service's fetcher
    pub fn aggregator(&self) -> CatalogAggregator<F> {
        CatalogAggregator::new(Arc::clone(&self.fetcher))
    }

    /// Re-aggregate catalog and news from the current repository list.
    ///
    /// Overlapping refreshes are not coordinated: whichever finishes last
    /// replaces the snapshot.
    pub async fn refresh(&self) -> Snapshot {
        let urls = self.registry.load();
        let fetched = source::fetch_all(&self.fetcher, &urls).await;

        let snapshot = Snapshot {
            catalog: catalog::merge_catalog(&fetched).into(),
            news: news::merge_news(&fetched).into(),
        };
        *self.snapshot.write().await = snapshot.clone();

        tracing::info!(
            "Refreshed {} repositories: {} apps, {} news items",
            urls.len(),
            snapshot.catalog.len(),
            snapshot.news.len()
        );
        snapshot
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn catalog(&self) -> Arc<[AppRecord]> {
        Arc::clone(&self.snapshot.read().await.catalog)
    }

    pub async fn news(&self) -> Arc<[NewsItem]> {
        Arc::clone(&self.snapshot.read().await.news)
    }

    /// Look an app up in the current snapshot.
    pub async fn find_app(&self, bundle_identifier: &str, source_url: &str) -> Lookup {
        let snapshot = self.snapshot.read().await;
        catalog::find(&snapshot.catalog, bundle_identifier, source_url)
            .cloned()
            .into()
    }

    /// Fetch the app's repository again and look it up there.
    pub async fn fetch_app(&self, bundle_identifier: &str, source_url: &str) -> Lookup {
        self.aggregator()
            .find_in_source(source_url, bundle_identifier)
            .await
            .into()
    }

    /// Refresh after every registry change until the returned task is aborted.
    ///
    /// Changes arriving while a refresh runs are coalesced into one
    /// follow-up refresh.
    pub fn watch_repositories(self: Arc<Self>) -> JoinHandle<()> {
        let notify = Arc::new(Notify::new());
        let subscription = {
            let notify = Arc::clone(&notify);
            self.registry.subscribe(move |_| notify.notify_one())
        };

        tokio::spawn(async move {
            let _subscription = subscription;
            loop {
                notify.notified().await;
                tracing::debug!("Repository list changed, refreshing");
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{Response, StubFetcher};
    use crate::state::JsonFileStore;
    use std::time::Duration;
    use tempfile::TempDir;

    const ALPHA: &str = r#"{
        "name": "Alpha",
        "apps": [{"bundleIdentifier": "com.alpha.app", "name": "Alpha App"}],
        "news": [{"title": "Alpha launch", "date": "2024-02-01", "appID": "com.alpha.app"}]
    }"#;

    const BETA: &str = r#"{
        "name": "Beta",
        "apps": [{"bundleIdentifier": "com.beta.app", "name": "Beta App"}]
    }"#;

    fn service(temp: &TempDir, fetcher: StubFetcher, repos: &[&str]) -> Arc<StoreService<StubFetcher>> {
        let store = JsonFileStore::new(temp.path().join("state.json"));
        let defaults = repos.iter().map(|s| s.to_string()).collect();
        let registry = Arc::new(RepoRegistry::new(Arc::new(store), defaults));
        Arc::new(StoreService::new(registry, Arc::new(fetcher)))
    }

    async fn wait_for_catalog_len(service: &StoreService<StubFetcher>, len: usize) {
        for _ in 0..200 {
            if service.catalog().await.len() == len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("catalog never reached {len} apps");
    }

    #[tokio::test]
    async fn test_snapshot_empty_before_refresh() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp, StubFetcher::new(), &["https://alpha.example"]);

        assert!(service.catalog().await.is_empty());
        assert!(service.news().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_fetches_each_repository_once() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new()
            .with("https://alpha.example", Response::Body(ALPHA.into()))
            .with("https://beta.example", Response::Body(BETA.into()));
        let service = service(&temp, fetcher, &["https://alpha.example", "https://beta.example"]);

        let snapshot = service.refresh().await;

        assert_eq!(snapshot.catalog.len(), 2);
        assert_eq!(snapshot.news.len(), 1);
        assert_eq!(service.fetcher.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(service.catalog().await.len(), 2);
    }

    #[tokio::test]
    async fn test_find_app_in_snapshot() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new().with("https://alpha.example", Response::Body(ALPHA.into()));
        let service = service(&temp, fetcher, &["https://alpha.example"]);
        service.refresh().await;

        let found = service
            .find_app("com.alpha.app", "https://alpha.example")
            .await
            .found()
            .unwrap();
        assert_eq!(found.source_name, "Alpha");

        assert_eq!(
            service.find_app("com.alpha.app", "https://other.example").await,
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_news_link_resolves_against_snapshot() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new().with("https://alpha.example", Response::Body(ALPHA.into()));
        let service = service(&temp, fetcher, &["https://alpha.example"]);

        let snapshot = service.refresh().await;

        let linked = snapshot.news[0].linked_app(&snapshot.catalog).unwrap();
        assert_eq!(linked.name, "Alpha App");
    }

    #[tokio::test]
    async fn test_fetch_app_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new().with("https://alpha.example", Response::Body(ALPHA.into()));
        let service = service(&temp, fetcher, &["https://alpha.example"]);

        assert!(matches!(
            service.fetch_app("com.alpha.app", "https://alpha.example").await,
            Lookup::Found(_)
        ));
        assert_eq!(
            service.fetch_app("com.alpha.gone", "https://alpha.example").await,
            Lookup::NotFound
        );
        assert_eq!(
            service.fetch_app("com.alpha.app", "https://down.example").await,
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_last_finished_refresh_wins() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new().with(
            "https://alpha.example",
            Response::Delayed(Duration::from_millis(100), ALPHA.into()),
        );
        let service = service(&temp, fetcher, &["https://alpha.example"]);

        let slow = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        service
            .fetcher
            .set("https://alpha.example", Response::Body(BETA.into()));
        service.refresh().await;
        assert_eq!(service.catalog().await[0].name, "Beta App");

        slow.await.unwrap();
        assert_eq!(service.catalog().await[0].name, "Alpha App");
    }

    #[tokio::test]
    async fn test_watch_refreshes_on_registry_change() {
        let temp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new()
            .with("https://alpha.example", Response::Body(ALPHA.into()))
            .with("https://beta.example", Response::Body(BETA.into()));
        let service = service(&temp, fetcher, &["https://alpha.example"]);
        service.refresh().await;

        let watcher = Arc::clone(&service).watch_repositories();
        assert_eq!(service.registry().subscriber_count(), 1);

        service.registry().add("https://beta.example").unwrap();
        wait_for_catalog_len(&service, 2).await;

        service.registry().reset_to_default().unwrap();
        wait_for_catalog_len(&service, 1).await;

        watcher.abort();
        let _ = watcher.await;
        assert_eq!(service.registry().subscriber_count(), 0);
    }
}
