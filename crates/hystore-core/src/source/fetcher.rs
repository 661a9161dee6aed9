//! HTTP retrieval of repository documents

use std::future::Future;

use anyhow::Context;
use url::Url;

use super::schema::SourceDocument;
use crate::config::NetworkConfig;

/// Retrieves one repository document by URL.
///
/// Implementations report every failure (transport, status, decoding) as an
/// error; isolating those failures is the caller's job.
pub trait SourceFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<SourceDocument>> + Send;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(network.user_agent.clone())
            .timeout(network.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<SourceDocument> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid repository URL: {}", url))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Unsupported repository URL scheme '{}': {}", parsed.scheme(), url);
        }

        tracing::debug!("Fetching repository {url}");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .with_context(|| format!("Failed to fetch repository from {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch repository: HTTP {} from {}", status, url);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read repository body from {}", url))?;

        SourceDocument::parse(&body).with_context(|| format!("Invalid repository at {}", url))
    }
}
