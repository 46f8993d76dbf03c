//! The browser collaborator boundary.
//!
//! The orchestrator only ever talks to [`SearchBrowser`]; the production
//! implementation renders pages through a Browserless-style HTTP service.
//! Tests script the trait directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use headless_client::{HeadlessClient, SessionOptions};

/// Base of the platform whose search results we collect from.
pub const PLATFORM_BASE: &str = "https://www.tiktok.com";

#[async_trait]
pub trait SearchBrowser: Send + Sync {
    /// Render the search results page for a query. `scroll_passes` controls
    /// how much lazy content is loaded before the DOM is serialized — each
    /// listing cycle asks for one more pass than the last.
    async fn search_page(&self, query: &str, scroll_passes: u32) -> Result<String>;

    /// Render a single video page.
    async fn video_page(&self, url: &str) -> Result<String>;

    /// Capture a full-page PNG screenshot of a video page.
    async fn screenshot(&self, url: &str) -> Result<Vec<u8>>;

    fn name(&self) -> &str;
}

pub struct HeadlessBrowser {
    client: HeadlessClient,
}

impl HeadlessBrowser {
    pub fn new(base_url: &str, token: Option<&str>, options: SessionOptions) -> Self {
        info!(base_url, "Using headless browser service");
        Self {
            client: HeadlessClient::new(base_url, token, options),
        }
    }

    fn search_url(query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{PLATFORM_BASE}/search?q={encoded}")
    }
}

#[async_trait]
impl SearchBrowser for HeadlessBrowser {
    async fn search_page(&self, query: &str, scroll_passes: u32) -> Result<String> {
        let url = Self::search_url(query);
        info!(query, scroll_passes, browser = self.name(), "Rendering search page");
        self.client
            .content(&url, scroll_passes)
            .await
            .context("Search page render failed")
    }

    async fn video_page(&self, url: &str) -> Result<String> {
        info!(url, browser = self.name(), "Rendering video page");
        self.client
            .content(url, 0)
            .await
            .context("Video page render failed")
    }

    async fn screenshot(&self, url: &str) -> Result<Vec<u8>> {
        self.client
            .screenshot(url)
            .await
            .context("Screenshot capture failed")
    }

    fn name(&self) -> &str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        assert_eq!(
            HeadlessBrowser::search_url("promo gratis"),
            "https://www.tiktok.com/search?q=promo+gratis"
        );
    }
}
