//! Link scraping
//!
//! Turning a URL into link metadata is done by an external service. The
//! server only sees it through [`LinkScraper`]: [`HttpScraper`] forwards to a
//! configured endpoint, [`StaticScraper`] answers from fixtures and
//! [`DisabledScraper`] reports the service as unavailable.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::core::config::ScraperConfig;
use crate::types::{Error, Post, Result};

/// Metadata extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Page description
    #[serde(default)]
    pub description: String,
    /// Preview image
    #[serde(default)]
    pub image_url: String,
    /// Publishing site
    #[serde(default)]
    pub site_name: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Canonical url
    #[serde(default)]
    pub url: String,
    /// Content type
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl From<LinkMetadata> for Post {
    fn from(meta: LinkMetadata) -> Self {
        Post {
            id: None,
            title: meta.title,
            description: meta.description,
            thumbnail_url: meta.image_url,
            site_name: meta.site_name,
            url: meta.url,
            post_type: meta.kind,
            author: meta.author,
        }
    }
}

/// Link preview service
#[async_trait]
pub trait LinkScraper: Send + Sync {
    /// Fetch metadata for an already validated url
    async fn scrape(&self, url: &Url) -> Result<LinkMetadata>;
}

/// Parse and check a user-supplied url: http(s) with a host
pub fn validate_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid_input("url is empty"));
    }
    let url = Url::parse(raw).map_err(|e| Error::invalid_input(format!("invalid url {:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_input(format!("unsupported url scheme: {}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::invalid_input(format!("url has no host: {}", raw)));
    }
    Ok(url)
}

/// Scrape `raw` and normalize the result into an unsaved post.
///
/// An empty title means the target had nothing usable and is reported as
/// `Unsupported`. A missing canonical url falls back to the requested one.
pub async fn scrape_post(scraper: &dyn LinkScraper, raw: &str) -> Result<Post> {
    let url = validate_url(raw)?;
    let mut meta = scraper.scrape(&url).await?;
    if meta.title.trim().is_empty() {
        return Err(Error::unsupported(format!("no previewable content at {}", url)));
    }
    if meta.url.trim().is_empty() {
        meta.url = url.to_string();
    }
    Ok(meta.into())
}

/// Forwards scrape requests to an external HTTP endpoint
pub struct HttpScraper {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
}

impl HttpScraper {
    /// Create a scraper posting to `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build scrape client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LinkScraper for HttpScraper {
    async fn scrape(&self, url: &Url) -> Result<LinkMetadata> {
        tracing::debug!(url = %url, endpoint = %self.endpoint, "scraping link");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScrapeRequest { url: url.as_str() })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::unavailable(format!("scrape of {} timed out", url))
                } else {
                    Error::unavailable(format!("scrape service unreachable: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(Error::unsupported(format!("scrape service rejected {} ({})", url, status)));
        }
        if !status.is_success() {
            return Err(Error::unavailable(format!("scrape service answered {}", status)));
        }

        response
            .json::<LinkMetadata>()
            .await
            .map_err(|e| Error::unavailable(format!("unreadable scrape response: {}", e)))
    }
}

/// Scraper answering from a fixed url → metadata table
#[derive(Default)]
pub struct StaticScraper {
    pages: HashMap<String, LinkMetadata>,
}

impl StaticScraper {
    /// Empty table; every url is unsupported
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for `url`
    pub fn with_page(mut self, url: &str, meta: LinkMetadata) -> Self {
        let key = validate_url(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        self.pages.insert(key, meta);
        self
    }
}

#[async_trait]
impl LinkScraper for StaticScraper {
    async fn scrape(&self, url: &Url) -> Result<LinkMetadata> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::unsupported(format!("no preview for {}", url)))
    }
}

/// Used when no scrape endpoint is configured
pub struct DisabledScraper;

#[async_trait]
impl LinkScraper for DisabledScraper {
    async fn scrape(&self, _url: &Url) -> Result<LinkMetadata> {
        Err(Error::unavailable("no scrape service configured"))
    }
}

/// Build the scraper described by `config`
pub fn from_config(config: &ScraperConfig) -> Result<Box<dyn LinkScraper>> {
    match &config.endpoint {
        Some(endpoint) => Ok(Box::new(HttpScraper::new(endpoint.clone(), config.timeout)?)),
        None => {
            tracing::warn!("no scraper endpoint configured; post creation is disabled");
            Ok(Box::new(DisabledScraper))
        }
    }
}
