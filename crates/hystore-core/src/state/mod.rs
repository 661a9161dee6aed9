//! Persisted client state
//!
//! A small key/value layer over a single JSON document. Values are stored as
//! strings, so callers JSON-encode structured values (the repository list)
//! themselves, the same way the keys are written by other clients of the
//! `customRepos` / `preferredMethod` format.

mod json_file;

pub use json_file::JsonFileStore;

/// Key holding the JSON-encoded ordered repository list
pub const CUSTOM_REPOS_KEY: &str = "customRepos";

/// Key holding the preferred install method
pub const PREFERRED_METHOD_KEY: &str = "preferredMethod";

/// String key/value persistence.
///
/// `get` distinguishes "never written" (`Ok(None)`) from a read failure
/// (`Err`). `set` must be durable when it returns `Ok`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }
}
