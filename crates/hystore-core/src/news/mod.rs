//! News aggregation
//!
//! Collects the optional `news` arrays of every repository with the same
//! per-repository failure isolation as the catalog, then orders the merged
//! list newest first.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::catalog;
use crate::source::{self, AppRecord, FetchedSource, NewsItem, SourceFetcher};

/// Where a news item leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsLink<'a> {
    /// An app identified by bundle id plus the item's own repository URL.
    /// Resolves only if that repository's records are in the catalog.
    App {
        bundle_identifier: &'a str,
        source_url: &'a str,
    },
    /// A web page outside the catalog
    External(&'a str),
    /// Nothing to open
    None,
}

impl NewsItem {
    /// Classify the item: an `appID` makes it an internal reference,
    /// otherwise a `url` makes it an external link.
    pub fn link(&self) -> NewsLink<'_> {
        if let Some(app_id) = self.app_id.as_deref().filter(|id| !id.is_empty()) {
            return NewsLink::App {
                bundle_identifier: app_id,
                source_url: &self.source_url,
            };
        }
        match self.url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => NewsLink::External(url),
            None => NewsLink::None,
        }
    }

    /// Resolve an internal reference against the aggregated catalog.
    ///
    /// `None` when the repository that published the item was not aggregated
    /// or does not list the app.
    pub fn linked_app<'c>(&self, catalog: &'c [AppRecord]) -> Option<&'c AppRecord> {
        match self.link() {
            NewsLink::App {
                bundle_identifier,
                source_url,
            } => catalog::find(catalog, bundle_identifier, source_url),
            _ => None,
        }
    }

    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        parse_news_date(&self.date)
    }
}

/// Builds the merged news feed from a set of repository URLs
#[derive(Debug)]
pub struct NewsAggregator<F> {
    fetcher: Arc<F>,
}

impl<F> Clone for NewsAggregator<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<F: SourceFetcher> NewsAggregator<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// Fetch every repository and merge their news, newest first.
    pub async fn aggregate_news(&self, urls: &[String]) -> Vec<NewsItem> {
        let fetched = source::fetch_all(&self.fetcher, urls).await;
        merge_news(&fetched)
    }
}

/// Merge the news of already fetched repositories, newest first.
pub fn merge_news(sources: &[FetchedSource]) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = sources
        .iter()
        .filter_map(|fetched| {
            let entries = fetched.document.as_ref()?.news.as_deref()?;
            let items = source::decode_entries::<NewsItem>(entries, "news", &fetched.url)
                .into_iter()
                .map(move |mut item| {
                    item.source_url = fetched.url.clone();
                    item
                });
            Some(items)
        })
        .flatten()
        .collect();

    sort_newest_first(&mut items);
    tracing::debug!("Aggregated {} news items", items.len());
    items
}

/// Parse the date formats repositories publish.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`
/// and bare `YYYY-MM-DD` dates (interpreted as UTC).
pub fn parse_news_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Stable sort by descending date. Items without a parseable date go last.
pub fn sort_newest_first(items: &mut Vec<NewsItem>) {
    let mut keyed: Vec<_> = items
        .drain(..)
        .map(|item| {
            let date = item.parsed_date();
            ((date.is_none(), Reverse(date)), item)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    items.extend(keyed.into_iter().map(|(_, item)| item));
}
