pub mod error;

pub use error::{HeadlessError, Result};

use std::time::Duration;

/// Browser context options applied to every request of a session: they are
/// resolved once at startup and never change mid-run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub locale: String,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            locale: "en-US".to_string(),
            user_agent: None,
            proxy: None,
        }
    }
}

pub struct HeadlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    options: SessionOptions,
}

impl HeadlessClient {
    pub fn new(base_url: &str, token: Option<&str>, options: SessionOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            options,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let mut endpoint = format!("{}{path}", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    fn launch_options(&self) -> serde_json::Value {
        let mut launch = serde_json::json!({
            "headless": self.options.headless,
            "locale": self.options.locale,
        });
        if let Some(ref ua) = self.options.user_agent {
            launch["userAgent"] = serde_json::json!(ua);
        }
        if let Some(ref proxy) = self.options.proxy {
            launch["proxy"] = serde_json::json!({ "server": proxy });
        }
        launch
    }

    /// Fetch fully-rendered HTML for a URL via the /content endpoint.
    /// `scroll_passes` asks the service to scroll to the page bottom that
    /// many times before serializing the DOM, loading lazy content.
    pub async fn content(&self, url: &str, scroll_passes: u32) -> Result<String> {
        let body = serde_json::json!({
            "url": url,
            "launch": self.launch_options(),
            "scrollPage": scroll_passes > 0,
            "scrollTimes": scroll_passes,
            "gotoOptions": { "waitUntil": "domcontentloaded" },
        });

        let resp = self
            .client
            .post(self.endpoint("/content"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HeadlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }

    /// Capture a full-page PNG screenshot via the /screenshot endpoint.
    pub async fn screenshot(&self, url: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "url": url,
            "launch": self.launch_options(),
            "options": { "fullPage": true, "type": "png" },
        });

        let resp = self
            .client
            .post(self.endpoint("/screenshot"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HeadlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
