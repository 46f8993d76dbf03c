//! Shim around an external video-downloading tool (yt-dlp compatible).
//!
//! Success or failure is the subprocess exit status, nothing more; the
//! collector treats any failure as a logged, non-fatal side effect.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

/// Hard ceiling on a single download attempt.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub struct VideoDownloader {
    bin: String,
    out_dir: PathBuf,
}

impl VideoDownloader {
    pub fn new(bin: &str, out_dir: PathBuf) -> Self {
        Self {
            bin: bin.to_string(),
            out_dir,
        }
    }

    /// Download one video into the output directory, named by the tool's
    /// `<id>.<ext>` template.
    pub async fn fetch(&self, url: &str) -> Result<()> {
        let template = self
            .out_dir
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        info!(url, bin = self.bin.as_str(), "Downloading video");

        let result = tokio::time::timeout(
            DOWNLOAD_TIMEOUT,
            tokio::process::Command::new(&self.bin)
                .args([
                    "--no-progress",
                    "--no-playlist",
                    "-o",
                    template.as_str(),
                    url,
                ])
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                anyhow::bail!(
                    "{} exited with {}: {}",
                    self.bin,
                    output.status,
                    stderr.trim()
                )
            }
            Ok(Err(e)) => Err(e).with_context(|| format!("Failed to launch {}", self.bin)),
            Err(_) => anyhow::bail!(
                "{} timed out after {}s for {url}",
                self.bin,
                DOWNLOAD_TIMEOUT.as_secs()
            ),
        }
    }
}
