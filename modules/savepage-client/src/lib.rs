//! Client for a Wayback-style "save page now" archival service.
//!
//! A submission either yields a snapshot URL or it doesn't; the service is
//! best-effort by contract, so "no snapshot" is `Ok(None)`, not an error.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

pub type Result<T> = std::result::Result<T, SavePageError>;

#[derive(Debug, Error)]
pub enum SavePageError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for SavePageError {
    fn from(err: reqwest::Error) -> Self {
        SavePageError::Network(err.to_string())
    }
}

/// Snapshot paths look like `/web/20260314120000/https://...`.
static SNAPSHOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/web/\d{14}[^\s"'<>]*"#).expect("valid regex"));

pub struct SavePageClient {
    client: reqwest::Client,
    base_url: String,
}

impl SavePageClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit a URL for archival. Returns the snapshot URL when the service
    /// reports one via the `Content-Location` header or an embedded
    /// `/web/<timestamp>/` path in the body; `Ok(None)` otherwise.
    pub async fn save(&self, target: &str) -> Result<Option<String>> {
        let endpoint = format!("{}/save/{target}", self.base_url);

        let resp = self.client.post(&endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SavePageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if let Some(location) = resp
            .headers()
            .get("content-location")
            .and_then(|v| v.to_str().ok())
        {
            return Ok(Some(self.absolute(location)));
        }

        let body = resp.text().await.unwrap_or_default();
        match extract_snapshot_path(&body) {
            Some(path) => Ok(Some(self.absolute(&path))),
            None => {
                debug!(url = target, "no snapshot location in archive response");
                Ok(None)
            }
        }
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{path}", self.base_url)
        }
    }
}

/// Find the first `/web/<14-digit timestamp>/...` path in a response body.
pub fn extract_snapshot_path(body: &str) -> Option<String> {
    SNAPSHOT_RE.find(body).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_path_found_in_body() {
        let body = r#"<a href="/web/20260314120000/https://x.com/@a/video/1">archived</a>"#;
        assert_eq!(
            extract_snapshot_path(body).as_deref(),
            Some("/web/20260314120000/https://x.com/@a/video/1")
        );
    }

    #[test]
    fn short_timestamp_is_not_a_snapshot() {
        assert_eq!(extract_snapshot_path("/web/2026/foo"), None);
    }

    #[test]
    fn empty_body_has_no_snapshot() {
        assert_eq!(extract_snapshot_path(""), None);
    }
}
