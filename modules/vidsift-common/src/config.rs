use std::env;

/// Service endpoints and tool paths loaded from environment variables.
/// Everything here has a workable default so the CLI runs against a local
/// Browserless container out of the box.
#[derive(Debug, Clone)]
pub struct Config {
    // Headless browser service
    pub browser_url: String,
    pub browser_token: Option<String>,

    // Archival snapshot service
    pub savepage_url: String,

    // External video downloader binary
    pub downloader_bin: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            browser_url: env::var("BROWSER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            browser_token: env::var("BROWSER_TOKEN").ok().filter(|t| !t.is_empty()),
            savepage_url: env::var("SAVEPAGE_URL")
                .unwrap_or_else(|_| "https://web.archive.org".to_string()),
            downloader_bin: env::var("DOWNLOADER_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
        }
    }
}
