//! Search and sort projections over the aggregated catalog.
//!
//! Every projection is computed from the full catalog. Nothing here narrows
//! a previous result, so changing the query or the sort order never carries
//! stale state forward.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::localize;
use crate::source::AppRecord;

/// Catalog ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Aggregation order: repository list order, then order within each repository
    #[default]
    Default,
    /// Ascending by name in the user's language
    Alphabetical,
}

impl FromStr for SortOption {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(SortOption::Default),
            "alphabetical" | "alpha" | "name" => Ok(SortOption::Alphabetical),
            _ => anyhow::bail!(
                "Unknown sort option: '{}'. Use 'default' or 'alphabetical'",
                s
            ),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOption::Default => f.write_str("default"),
            SortOption::Alphabetical => f.write_str("alphabetical"),
        }
    }
}

/// Records whose name contains `query`, ignoring case.
///
/// The query is matched as a raw substring; an empty query keeps everything.
pub fn filter<'a, I>(records: I, query: &str) -> Vec<&'a AppRecord>
where
    I: IntoIterator<Item = &'a AppRecord>,
{
    if query.is_empty() {
        return records.into_iter().collect();
    }

    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(|app| app.name.to_lowercase().contains(&needle))
        .collect()
}

/// The full catalog in the requested order. The sort is stable.
pub fn sort(catalog: &[AppRecord], option: SortOption) -> Vec<&AppRecord> {
    let mut ordered: Vec<&AppRecord> = catalog.iter().collect();
    match option {
        SortOption::Default => {}
        SortOption::Alphabetical => {
            ordered.sort_by(|a, b| localize::compare(&a.name, &b.name));
        }
    }
    ordered
}

/// A browsable view: the full catalog plus the current query and order.
#[derive(Debug, Clone)]
pub struct SearchSortView {
    catalog: Arc<[AppRecord]>,
    query: String,
    sort: SortOption,
}

impl SearchSortView {
    pub fn new(catalog: Arc<[AppRecord]>) -> Self {
        Self {
            catalog,
            query: String::new(),
            sort: SortOption::Default,
        }
    }

    /// Swap in a freshly aggregated catalog, keeping query and order.
    pub fn set_catalog(&mut self, catalog: Arc<[AppRecord]>) {
        self.catalog = catalog;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_option(&self) -> SortOption {
        self.sort
    }

    pub fn catalog(&self) -> &[AppRecord] {
        &self.catalog
    }

    /// Records to display, derived from the full catalog.
    pub fn records(&self) -> Vec<&AppRecord> {
        filter(sort(&self.catalog, self.sort), &self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, source: &str) -> AppRecord {
        AppRecord {
            bundle_identifier: format!("com.example.{}", name.to_lowercase()),
            name: name.to_string(),
            source_url: source.to_string(),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<AppRecord> {
        vec![
            app("delta", "https://a"),
            app("Cherry", "https://a"),
            app("apple", "https://b"),
            app("Banana", "https://b"),
            app("Apple", "https://c"),
        ]
    }

    fn names(records: &[&AppRecord]) -> Vec<String> {
        records.iter().map(|a| a.name.clone()).collect()
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let catalog = catalog();
        let filtered = filter(&catalog, "");
        assert_eq!(filtered.len(), catalog.len());
        assert!(filtered.iter().zip(&catalog).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let catalog = catalog();
        assert_eq!(names(&filter(&catalog, "APP")), vec!["apple", "Apple"]);
        assert_eq!(names(&filter(&catalog, "an")), vec!["Banana"]);
    }

    #[test]
    fn test_filter_does_not_trim_query() {
        let catalog = catalog();
        assert!(filter(&catalog, " apple").is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let catalog = catalog();
        let once = filter(&catalog, "e");
        let twice = filter(once.iter().copied(), "e");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_alphabetical_ignores_case_first_ordering() {
        let catalog = catalog();
        let sorted = sort(&catalog, SortOption::Alphabetical);

        let order: Vec<_> = sorted
            .iter()
            .map(|a| (a.name.as_str(), a.source_url.as_str()))
            .collect();
        assert_eq!(order[2], ("Banana", "https://b"));
        assert_eq!(order[3], ("Cherry", "https://a"));
        assert_eq!(order[4], ("delta", "https://a"));
        assert!(order[..2].iter().all(|(n, _)| n.eq_ignore_ascii_case("apple")));
    }

    #[test]
    fn test_stable_for_identical_names() {
        let catalog = vec![app("Same", "https://1"), app("Same", "https://2"), app("Same", "https://3")];
        let sorted = sort(&catalog, SortOption::Alphabetical);
        let sources: Vec<_> = sorted.iter().map(|a| a.source_url.as_str()).collect();
        assert_eq!(sources, vec!["https://1", "https://2", "https://3"]);
    }

    #[test]
    fn test_default_restores_canonical_order() {
        let catalog = catalog();
        let mut view = SearchSortView::new(catalog.clone().into());

        view.set_sort(SortOption::Alphabetical);
        view.set_query("a");
        let _ = view.records();
        view.set_query("");
        view.set_sort(SortOption::Default);

        let restored: Vec<AppRecord> = view.records().into_iter().cloned().collect();
        assert_eq!(restored, catalog);
    }

    #[test]
    fn test_view_never_compounds_queries() {
        let mut view = SearchSortView::new(catalog().into());

        view.set_query("apple");
        assert_eq!(view.records().len(), 2);

        view.set_query("banana");
        assert_eq!(names(&view.records()), vec!["Banana"]);
    }

    #[test]
    fn test_view_combines_filter_and_sort() {
        let mut view = SearchSortView::new(catalog().into());
        view.set_query("e");
        view.set_sort(SortOption::Alphabetical);

        let shown = names(&view.records());
        assert_eq!(shown.len(), 4);
        assert_eq!(shown.last().map(String::as_str), Some("delta"));
    }

    #[test]
    fn test_set_catalog_keeps_query() {
        let mut view = SearchSortView::new(catalog().into());
        view.set_query("cherry");

        view.set_catalog(vec![app("Cherry Pie", "https://z"), app("Plum", "https://z")].into());

        assert_eq!(names(&view.records()), vec!["Cherry Pie"]);
    }

    #[test]
    fn test_sort_option_parse() {
        assert_eq!("Alphabetical".parse::<SortOption>().unwrap(), SortOption::Alphabetical);
        assert_eq!("default".parse::<SortOption>().unwrap(), SortOption::Default);
        assert!("newest".parse::<SortOption>().is_err());
    }
}
