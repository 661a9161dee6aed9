//! Repository document schema
//!
//! Mirrors the AltStore-style `apps.json` format published by repositories.
//! Only the fields the client reads are typed; anything else a publisher
//! includes is kept in `extra` so it survives serialization. Typed fields
//! decode leniently: a value of the wrong JSON type degrades to empty instead
//! of rejecting the whole entry.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One fetched repository document.
///
/// `apps` and `news` are kept as raw values so a single malformed entry can
/// be skipped without discarding the rest of the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    /// Repository display name
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,

    #[serde(default)]
    pub apps: Option<Vec<Value>>,

    #[serde(default)]
    pub news: Option<Vec<Value>>,
}

impl SourceDocument {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse repository document: {}", e))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A single application entry, tagged with the repository it came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub bundle_identifier: String,

    #[serde(deserialize_with = "lenient::string")]
    pub name: String,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub developer_name: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(
        rename = "iconURL",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon_url: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tint_color: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub version_date: Option<String>,

    /// Size in bytes
    #[serde(deserialize_with = "lenient::size", skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub localized_description: Option<String>,

    #[serde(
        rename = "screenshotURLs",
        deserialize_with = "lenient::list",
        skip_serializing_if = "Option::is_none"
    )]
    pub screenshot_urls: Option<Vec<Screenshot>>,

    #[serde(
        rename = "downloadURL",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_url: Option<String>,

    /// Release history, newest first
    #[serde(deserialize_with = "lenient::list", skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<VersionInfo>>,

    /// Injected by the aggregator
    #[serde(deserialize_with = "lenient::string")]
    pub source_name: String,

    /// Injected by the aggregator
    #[serde(deserialize_with = "lenient::string")]
    pub source_url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Screenshots are either bare URLs or image objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Screenshot {
    Url(String),
    Image {
        #[serde(rename = "imageURL")]
        image_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
}

impl Screenshot {
    pub fn url(&self) -> &str {
        match self {
            Screenshot::Url(url) => url,
            Screenshot::Image { image_url, .. } => image_url,
        }
    }
}

/// One entry of an app's `versions` array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionInfo {
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub localized_description: Option<String>,

    #[serde(
        rename = "downloadURL",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_url: Option<String>,

    #[serde(deserialize_with = "lenient::size", skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppRecord {
    /// URL the install handoff should use.
    ///
    /// With a non-empty `versions` array the first (newest) entry wins, even
    /// when it carries no URL. Otherwise the top-level `downloadURL` is used.
    pub fn effective_download_url(&self) -> Option<&str> {
        let url = match self.versions.as_deref() {
            Some([latest, ..]) => latest.download_url.as_deref(),
            _ => self.download_url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }

    /// Version shown to the user, preferring the newest `versions` entry
    pub fn latest_version(&self) -> Option<&str> {
        match self.versions.as_deref() {
            Some([latest, ..]) if latest.version.is_some() => latest.version.as_deref(),
            _ => self.version.as_deref(),
        }
    }

    /// Size formatted in megabytes, e.g. `"12.34 MB"`
    pub fn display_size(&self) -> Option<String> {
        self.size
            .filter(|size| *size > 0.0)
            .map(|size| format!("{:.2} MB", size / 1024.0 / 1024.0))
    }

    /// Display identity: the same bundle may be listed by several repositories
    pub fn key(&self) -> (&str, &str) {
        (&self.bundle_identifier, &self.source_url)
    }
}

/// A news entry, tagged with the repository it came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(deserialize_with = "lenient::string")]
    pub title: String,

    #[serde(deserialize_with = "lenient::string")]
    pub date: String,

    #[serde(
        rename = "imageURL",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tint_color: Option<String>,

    #[serde(deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bundle identifier of the linked app. It resolves only against catalog
    /// records tagged with this item's `source_url`, so the app must be listed
    /// by the same repository and that repository must be in the catalog.
    #[serde(
        rename = "appID",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub app_id: Option<String>,

    /// Injected by the aggregator
    #[serde(deserialize_with = "lenient::string")]
    pub source_url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field decoders that never fail on a mismatched JSON type
mod lenient {
    use super::*;

    /// Text of a scalar; numbers and booleans are stringified.
    fn text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(text(Value::deserialize(deserializer)?))
    }

    /// Byte count given as a number or a numeric string
    pub fn size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Array whose undecodable elements are dropped; a non-array is `None`.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| T::deserialize(item).ok())
                    .collect(),
            ),
            _ => None,
        })
    }
}
