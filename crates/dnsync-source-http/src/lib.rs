// # HTTP List Source
//
// This crate loads the desired block and override lists of the dnsync
// system from hosts-format files served over HTTP(S).
//
// ## Behavior
//
// - Every configured URL is fetched once per run
// - Lists are parsed with the rules of the `hosts` module
// - Results keep source order, then line order (first occurrence wins later,
//   in the core `DesiredSet`)
// - Any fetch failure fails the whole load: a partial list would make the
//   reconcilers treat missing domains as unwanted

pub mod hosts;

pub use hosts::{HostsEntry, parse_blocklist, parse_line, parse_overrides};

use async_trait::async_trait;
use dnsync_core::traits::SourceLoader;
use dnsync_core::{Error, Result, RewriteRoute};
use futures::future::try_join_all;
use std::time::Duration;

/// Default timeout for list downloads
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads hosts-format lists over HTTP
#[derive(Debug, Clone)]
pub struct HttpSourceLoader {
    client: reqwest::Client,
}

impl HttpSourceLoader {
    /// Create a loader with the default download timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a loader with a custom download timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Download one list
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching list {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::source_list(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::source_list(format!(
                "{} answered HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::source_list(format!("Failed to read {}: {}", url, e)))
    }

    /// Download every list, keeping source order
    async fn fetch_all(&self, sources: &[String]) -> Result<Vec<String>> {
        try_join_all(sources.iter().map(|url| self.fetch(url))).await
    }
}

#[async_trait]
impl SourceLoader for HttpSourceLoader {
    async fn load_blocklist(&self, sources: &[String]) -> Result<Vec<String>> {
        let lists = self.fetch_all(sources).await?;
        Ok(lists.iter().flat_map(|text| parse_blocklist(text)).collect())
    }

    async fn load_rewrites(&self, sources: &[String]) -> Result<Vec<RewriteRoute>> {
        let lists = self.fetch_all(sources).await?;
        let routes: Vec<RewriteRoute> = lists.iter().flat_map(|text| parse_overrides(text)).collect();
        for route in &routes {
            tracing::debug!("Processing: {} -> {}", route.domain, route.ip);
        }
        Ok(routes)
    }
}
