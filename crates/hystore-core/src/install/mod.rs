//! Install methods and the persisted preference

mod dispatcher;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::state::{KeyValueStore, PREFERRED_METHOD_KEY};

pub use dispatcher::{
    DispatchError, Handoff, InstallDispatcher, Navigator, SystemOpener, target_url,
};

/// How an app is handed off for installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// Open the download URL with the system handler
    #[default]
    Default,
    AltStore,
    SideStore,
    TrollStore,
    Scarlet,
    TanaraSign,
}

impl InstallMethod {
    pub const ALL: [InstallMethod; 6] = [
        InstallMethod::Default,
        InstallMethod::TrollStore,
        InstallMethod::SideStore,
        InstallMethod::Scarlet,
        InstallMethod::AltStore,
        InstallMethod::TanaraSign,
    ];

    /// Persisted key
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallMethod::Default => "default",
            InstallMethod::AltStore => "altstore",
            InstallMethod::SideStore => "sidestore",
            InstallMethod::TrollStore => "trollstore",
            InstallMethod::Scarlet => "scarlet",
            InstallMethod::TanaraSign => "tanarasign",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            InstallMethod::Default => "Default",
            InstallMethod::AltStore => "AltStore",
            InstallMethod::SideStore => "SideStore",
            InstallMethod::TrollStore => "TrollStore",
            InstallMethod::Scarlet => "Scarlet",
            InstallMethod::TanaraSign => "TanaraSign",
        }
    }

    /// Custom-scheme prefix the encoded download URL is appended to.
    /// `None` for [`InstallMethod::Default`].
    pub fn scheme_prefix(&self) -> Option<&'static str> {
        match self {
            InstallMethod::Default => None,
            InstallMethod::AltStore => Some("altstore://install?url="),
            InstallMethod::SideStore => Some("sidestore://source?url="),
            InstallMethod::TrollStore => Some("apple-magnifier://install?url="),
            InstallMethod::Scarlet => Some("scarlet://install?url="),
            InstallMethod::TanaraSign => Some("opium://install="),
        }
    }

    /// Lenient parse: anything unrecognised is [`InstallMethod::Default`].
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown install method '{s}', using default");
            InstallMethod::Default
        })
    }
}

impl FromStr for InstallMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        InstallMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == key)
            .ok_or_else(|| {
                let known: Vec<_> = InstallMethod::ALL.iter().map(|m| m.as_str()).collect();
                anyhow::anyhow!("Unknown install method: '{}'. Use one of: {}", s, known.join(", "))
            })
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's preferred install method, read at dispatch time
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceStore").finish_non_exhaustive()
    }
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Missing, unknown or unreadable values all read as the default method.
    pub fn preferred_method(&self) -> InstallMethod {
        match self.store.get(PREFERRED_METHOD_KEY) {
            Ok(Some(raw)) => InstallMethod::parse_or_default(&raw),
            Ok(None) => InstallMethod::Default,
            Err(err) => {
                tracing::warn!("Failed to read preferred install method: {err:#}");
                InstallMethod::Default
            }
        }
    }

    pub fn set_preferred_method(&self, method: InstallMethod) -> anyhow::Result<()> {
        self.store
            .set(PREFERRED_METHOD_KEY, method.as_str())
            .with_context(|| format!("Failed to save preferred install method '{}'", method))?;
        tracing::info!("Preferred install method set to {}", method.label());
        Ok(())
    }
}
