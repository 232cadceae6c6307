pub mod extractor;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use ureq::Agent;

use self::extractor::extract_text;

/// Configuration for page fetching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User agent string to use for requests
    pub user_agent: String,
    /// Timeout for HTTP requests in seconds; requests wait forever when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for CrawlerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent: concat!("seek/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: None,
        }
    }
}

/// Blocking HTTP client used to fetch the pages listed in `urls.txt`
#[derive(Debug)]
pub struct HttpClient {
    agent: Agent,
}

impl HttpClient {
    #[inline]
    pub fn new(config: &CrawlerConfig) -> Self {
        // Error statuses still carry a page body, which is scraped like any other
        let agent = Agent::config_builder()
            .timeout_global(config.timeout_seconds.map(Duration::from_secs))
            .user_agent(&config.user_agent)
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }

    /// Perform a single HTTP GET request and return the response body
    #[inline]
    pub fn get(&self, url: &str) -> Result<String> {
        debug!("Making HTTP GET request to: {}", url);

        let mut response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("Failed to make HTTP request to {}", url))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("Failed to read response body from {}", url))?;

        debug!("Read {} bytes from {} (status {})", text.len(), url, status);
        Ok(text)
    }
}

impl Default for HttpClient {
    #[inline]
    fn default() -> Self {
        Self::new(&CrawlerConfig::default())
    }
}

/// Fetches pages and reduces them to their visible text
#[derive(Debug, Default)]
pub struct WebScraper {
    http_client: HttpClient,
}

impl WebScraper {
    #[inline]
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            http_client: HttpClient::new(config),
        }
    }

    /// Scrape every URL in order. The first failure aborts the whole batch.
    #[inline]
    pub fn scrape(&self, urls: &[String]) -> Result<Vec<String>> {
        info!("Scraping {} urls", urls.len());

        urls.iter()
            .map(|url| {
                let html = self.http_client.get(url)?;
                let text = extract_text(&html);
                info!("Scraped {} ({} chars of text)", url, text.len());
                Ok(text)
            })
            .collect()
    }
}

/// Read the newline-separated URL list, keeping file order.
/// Lines are trimmed and blank lines skipped; nothing else is validated.
#[inline]
pub fn read_url_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read url list: {}", path.display()))?;

    Ok(parse_url_list(&content))
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
