//! Locale-aware string ordering

use std::cmp::Ordering;
use std::sync::LazyLock;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale::{Locale, locale};

/// Collator for the system language, falling back to American English.
pub static LANGUAGE_SORTER: LazyLock<Option<CollatorBorrowed<'static>>> = LazyLock::new(|| {
    let create_collator =
        |locale: Locale| Collator::try_new(locale.into(), CollatorOptions::default()).ok();

    let collator = sys_locale::get_locale()
        .and_then(|tag| Locale::try_from_str(&tag).ok())
        .and_then(create_collator)
        .or_else(|| create_collator(locale!("en-US")));

    if collator.is_none() {
        tracing::warn!("No collator available, sorting by lowercase code points");
    }
    collator
});

/// Compare two display names in the user's language.
pub fn compare(a: &str, b: &str) -> Ordering {
    match LANGUAGE_SORTER.as_ref() {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
