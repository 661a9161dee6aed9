//! Install handoff
//!
//! Turns an app plus an install method into either a system "open" of the
//! download URL or a custom-scheme navigation to a sideloading client.

use std::future::Future;

use super::InstallMethod;
use crate::source::AppRecord;

/// Opens a URL with whatever the platform registers for it
pub trait SystemOpener: Send + Sync {
    fn open(&self, url: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Hands a custom-scheme URL to the sideloading client
pub trait Navigator: Send + Sync {
    /// Fails when no client accepts the URL.
    fn replace(&self, url: &str) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No download URL available for this app")]
    MissingDownloadUrl,

    #[error("Error opening {url}: {reason}")]
    OpenFailed { url: String, reason: String },
}

/// What a successful dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// Opened by the system opener
    Opened(String),
    /// Handed to the navigator
    Navigated(String),
}

impl Handoff {
    pub fn url(&self) -> &str {
        match self {
            Handoff::Opened(url) | Handoff::Navigated(url) => url,
        }
    }
}

/// Build the handoff URL for `download_url`.
///
/// `default` returns the URL untouched; every other method percent-encodes
/// it into its scheme template.
pub fn target_url(download_url: &str, method: InstallMethod) -> String {
    match method.scheme_prefix() {
        None => download_url.to_string(),
        Some(prefix) => format!("{prefix}{}", urlencoding::encode(download_url)),
    }
}

#[derive(Debug, Clone)]
pub struct InstallDispatcher<O, N> {
    opener: O,
    navigator: N,
}

impl<O: SystemOpener, N: Navigator> InstallDispatcher<O, N> {
    pub fn new(opener: O, navigator: N) -> Self {
        Self { opener, navigator }
    }

    /// Resolve the URL to hand off, guarding against apps without one.
    pub fn resolve_target_url(
        &self,
        app: &AppRecord,
        method: InstallMethod,
    ) -> Result<String, DispatchError> {
        let download_url = app
            .effective_download_url()
            .ok_or(DispatchError::MissingDownloadUrl)?;
        Ok(target_url(download_url, method))
    }

    /// Hand `target` off according to `method`.
    pub async fn dispatch(
        &self,
        target: &str,
        method: InstallMethod,
    ) -> Result<Handoff, DispatchError> {
        if target.trim().is_empty() {
            return Err(DispatchError::MissingDownloadUrl);
        }

        let open_failed = |err: anyhow::Error| {
            tracing::warn!("Failed to open {target}: {err:#}");
            DispatchError::OpenFailed {
                url: target.to_string(),
                reason: format!("{err:#}"),
            }
        };

        match method {
            InstallMethod::Default => {
                self.opener.open(target).await.map_err(open_failed)?;
                Ok(Handoff::Opened(target.to_string()))
            }
            _ => {
                tracing::debug!("Navigating to {target} for {}", method.label());
                self.navigator.replace(target).map_err(open_failed)?;
                Ok(Handoff::Navigated(target.to_string()))
            }
        }
    }

    /// Resolve and dispatch in one step.
    pub async fn install(
        &self,
        app: &AppRecord,
        method: InstallMethod,
    ) -> Result<Handoff, DispatchError> {
        let target = self.resolve_target_url(app, method)?;
        tracing::info!(
            "Installing {} from {} via {}",
            app.bundle_identifier,
            app.source_url,
            method.label()
        );
        self.dispatch(&target, method).await
    }
}
