//! Repository sources
//!
//! Fetches every registered repository concurrently. Each fetch runs in its
//! own task and its failure (network error, bad status, malformed JSON or a
//! panic) is turned into an empty result before the join, so the join itself
//! cannot fail and one broken repository never hides the others.

mod fetcher;
pub mod schema;

use std::sync::Arc;

pub use fetcher::{HttpFetcher, SourceFetcher};
pub use schema::{AppRecord, NewsItem, Screenshot, SourceDocument, VersionInfo};

/// Outcome of fetching one repository
#[derive(Debug, Clone)]
pub struct FetchedSource {
    /// URL exactly as registered
    pub url: String,
    /// `None` when the fetch failed
    pub document: Option<SourceDocument>,
}

/// Fetch all `urls` in parallel and return one result per URL, in input order.
pub async fn fetch_all<F: SourceFetcher>(fetcher: &Arc<F>, urls: &[String]) -> Vec<FetchedSource> {
    let tasks: Vec<_> = urls
        .iter()
        .map(|url| {
            let fetcher = Arc::clone(fetcher);
            let url = url.clone();
            tokio::spawn(async move {
                match fetcher.fetch(&url).await {
                    Ok(document) => Some(document),
                    Err(err) => {
                        tracing::warn!("Skipping repository {url}: {err:#}");
                        None
                    }
                }
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;

    urls.iter()
        .zip(results)
        .map(|(url, result)| {
            let document = result.unwrap_or_else(|err| {
                tracing::warn!("Repository task for {url} did not complete: {err}");
                None
            });
            FetchedSource {
                url: url.clone(),
                document,
            }
        })
        .collect()
}

/// Fetch a single repository, mapping failure to `None`.
pub async fn fetch_one<F: SourceFetcher>(fetcher: &F, url: &str) -> Option<SourceDocument> {
    match fetcher.fetch(url).await {
        Ok(document) => Some(document),
        Err(err) => {
            tracing::warn!("Failed to load repository {url}: {err:#}");
            None
        }
    }
}

/// Decode the raw elements of an `apps` or `news` array, skipping entries
/// that do not match the schema.
pub(crate) fn decode_entries<T: serde::de::DeserializeOwned>(
    entries: &[serde_json::Value],
    kind: &str,
    url: &str,
) -> Vec<T> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match T::deserialize(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping {kind} entry {index} from {url}: {err}");
                None
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{Response, StubFetcher};
    use super::*;

    #[tokio::test]
    async fn test_fetch_all_preserves_input_order() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .with("a", Response::Body(r#"{"name": "A", "apps": []}"#.into()))
                .with("b", Response::Body(r#"{"name": "B", "apps": []}"#.into())),
        );
        let urls = vec!["b".to_string(), "a".to_string()];

        let results = fetch_all(&fetcher, &urls).await;

        assert_eq!(results[0].url, "b");
        assert_eq!(results[0].document.as_ref().unwrap().display_name(), "B");
        assert_eq!(results[1].document.as_ref().unwrap().display_name(), "A");
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .with("ok", Response::Body(r#"{"name": "Ok", "apps": []}"#.into()))
                .with("bad", Response::Body("{ not json".into()))
                .with("down", Response::Fail("connection refused".into()))
                .with("boom", Response::Panic),
        );
        let urls: Vec<String> = ["bad", "down", "ok", "boom", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let results = fetch_all(&fetcher, &urls).await;

        assert_eq!(results.len(), 5);
        let ok: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].url, "ok");
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let fetcher = Arc::new(StubFetcher::new());
        assert!(fetch_all(&fetcher, &[]).await.is_empty());
    }

    #[test]
    fn test_decode_entries_skips_bad_elements() {
        let entries = vec![
            serde_json::json!({"bundleIdentifier": "a", "name": "A"}),
            serde_json::json!("not an object"),
            serde_json::json!({"bundleIdentifier": "b", "name": "B"}),
        ];

        let apps: Vec<AppRecord> = decode_entries(&entries, "app", "https://repo.example");

        assert_eq!(apps.len(), 2);
        assert_eq!(apps[1].bundle_identifier, "b");
    }
}
