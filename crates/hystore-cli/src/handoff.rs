//! Platform handoff for installs.

use anyhow::Context;

use hystore_core::install::{Navigator, SystemOpener};

/// Opens download URLs with the desktop's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOpener;

impl SystemOpener for CliOpener {
    async fn open(&self, url: &str) -> anyhow::Result<()> {
        open::that_detached(url).with_context(|| format!("Failed to open {}", url))
    }
}

/// Hands custom-scheme URLs to whichever client registered the scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct CliNavigator;

impl Navigator for CliNavigator {
    fn replace(&self, url: &str) -> anyhow::Result<()> {
        open::that_detached(url)
            .context("Is the install client for this scheme installed?")
    }
}
