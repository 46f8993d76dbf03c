//! Collection orchestrator: drives the browser collaborator from keyword to
//! final record set.
//!
//! One browser session, strictly sequential visits. The dedup set and record
//! list live here and are mutated only on this single control path. Side
//! effects (screenshots, downloads, archival snapshots) are best-effort and
//! never decide whether a record is kept.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use savepage_client::SavePageClient;
use vidsift_common::normalize::{extract_hashtags, url_identity};
use vidsift_common::{RISK_FLAG_HIGH, RISK_FLAG_MEDIUM, RunOptions, VideoRecord};

use crate::browser::{SearchBrowser, PLATFORM_BASE};
use crate::downloader::VideoDownloader;
use crate::extractor;
use crate::links;

/// Consecutive no-new-candidate listing cycles tolerated before a keyword's
/// collection stops. Bounds worst-case work against infinite-scroll pages.
pub const STAGNATION_LIMIT: u32 = 8;

/// How many collected descriptions are sampled when ranking pivot hashtags.
pub const PIVOT_SAMPLE: usize = 20;

/// Politeness pause between page visits. Not a correctness requirement.
const VISIT_PAUSE: Duration = Duration::from_millis(400);

/// Stats from a collection run.
#[derive(Debug, Default)]
pub struct CollectStats {
    pub keywords: u32,
    pub pivot_keywords: u32,
    pub candidates_found: u32,
    pub pages_visited: u32,
    pub pages_failed: u32,
    pub records_collected: u32,
    pub screenshots: u32,
    pub downloads: u32,
    pub snapshots: u32,
    pub risk_high: u32,
    pub risk_medium: u32,
}

impl std::fmt::Display for CollectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Collection Run Complete ===")?;
        writeln!(f, "Keywords searched:  {}", self.keywords)?;
        writeln!(f, "Pivot keywords:     {}", self.pivot_keywords)?;
        writeln!(f, "Candidates found:   {}", self.candidates_found)?;
        writeln!(f, "Pages visited:      {}", self.pages_visited)?;
        writeln!(f, "Pages failed:       {}", self.pages_failed)?;
        writeln!(f, "Records collected:  {}", self.records_collected)?;
        writeln!(f, "Screenshots:        {}", self.screenshots)?;
        writeln!(f, "Videos downloaded:  {}", self.downloads)?;
        writeln!(f, "Snapshots archived: {}", self.snapshots)?;
        writeln!(f, "\nRisk tiers:")?;
        writeln!(f, "  high (>= {}): {}", RISK_FLAG_HIGH, self.risk_high)?;
        writeln!(
            f,
            "  medium (>= {}): {}",
            RISK_FLAG_MEDIUM, self.risk_medium
        )?;
        Ok(())
    }
}

/// Outcome of one best-effort side effect, surfaced so the orchestrator can
/// log it; never an error path.
#[derive(Debug)]
enum SideEffectOutcome {
    Done,
    Skipped,
    Failed(String),
}

enum VisitOutcome {
    Collected(Box<VideoRecord>),
    Failed,
}

pub struct Collector {
    browser: Box<dyn SearchBrowser>,
    downloader: Option<VideoDownloader>,
    snapshots: Option<SavePageClient>,
    options: RunOptions,
    shots_dir: Option<PathBuf>,
    pause: Duration,
    interrupted: Arc<AtomicBool>,
}

impl Collector {
    pub fn new(browser: Box<dyn SearchBrowser>, options: RunOptions) -> Self {
        Self {
            browser,
            downloader: None,
            snapshots: None,
            options,
            shots_dir: None,
            pause: VISIT_PAUSE,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_downloader(mut self, downloader: VideoDownloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_snapshots(mut self, client: SavePageClient) -> Self {
        self.snapshots = Some(client);
        self
    }

    pub fn with_shots_dir(mut self, dir: PathBuf) -> Self {
        self.shots_dir = Some(dir);
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Flag checked at loop boundaries; setting it winds the run down with a
    /// best-effort flush of whatever was collected.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }

    /// Run a full collection cycle over the given keywords. Returns the
    /// final deduplicated record set in first-seen order, plus run stats.
    /// Partial results are returned even when the run is interrupted.
    pub async fn run(&self, keywords: &[String]) -> Result<(Vec<VideoRecord>, CollectStats)> {
        let mut stats = CollectStats::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut records: Vec<VideoRecord> = Vec::new();
        let mut run_keywords: Vec<String> = keywords.to_vec();

        self.collect_keywords(keywords, &mut seen, &mut records, &mut stats)
            .await;

        // Optional expansion: promote the most frequent discovered hashtags
        // to synthetic keywords and collect again. Already-seen identities
        // are not revisited or re-scored.
        if self.options.pivot_tags > 0 && !self.interrupted() && records.len() < self.options.limit
        {
            let tags = top_hashtags(&records, self.options.pivot_tags);
            if !tags.is_empty() {
                info!(tags = ?tags, "Pivoting on discovered hashtags");
                stats.pivot_keywords = tags.len() as u32;
                self.collect_keywords(&tags, &mut seen, &mut records, &mut stats)
                    .await;
                run_keywords.extend(tags);
            }
        }

        // Late-bound provenance stamp: every record carries the keywords
        // that contributed to the run.
        let stamp = run_keywords.join(",");
        for record in &mut records {
            record.keyword_searched = stamp.clone();
            if record.risk_score >= RISK_FLAG_HIGH {
                stats.risk_high += 1;
            }
            if record.risk_score >= RISK_FLAG_MEDIUM {
                stats.risk_medium += 1;
            }
        }
        stats.records_collected = records.len() as u32;

        info!("{stats}");
        Ok((records, stats))
    }

    async fn collect_keywords(
        &self,
        keywords: &[String],
        seen: &mut HashSet<String>,
        records: &mut Vec<VideoRecord>,
        stats: &mut CollectStats,
    ) {
        for keyword in keywords {
            if self.interrupted() || records.len() >= self.options.limit {
                break;
            }
            stats.keywords += 1;

            // Explicit override, else share the remaining budget evenly.
            let cap = self.options.per_keyword_limit.unwrap_or_else(|| {
                ((self.options.limit - records.len()) / keywords.len().max(1)).max(1)
            });

            let candidates = self.list_candidates(keyword, cap).await;
            info!(keyword = keyword.as_str(), count = candidates.len(), "Candidate URLs listed");
            stats.candidates_found += candidates.len() as u32;

            for url in candidates {
                if self.interrupted() || records.len() >= self.options.limit {
                    break;
                }
                // Visit each unique identity at most once per run.
                if !seen.insert(url.clone()) {
                    continue;
                }

                match self.visit(&url, stats).await {
                    VisitOutcome::Collected(record) => {
                        stats.pages_visited += 1;
                        records.push(*record);
                    }
                    VisitOutcome::Failed => {
                        stats.pages_failed += 1;
                    }
                }

                tokio::time::sleep(self.pause).await;
            }
        }
    }

    /// One "list visible links, then trigger further content load" loop.
    /// Candidates come back query-stripped, in first-seen order. Stops at
    /// the cap or after [`STAGNATION_LIMIT`] consecutive cycles without a
    /// new candidate.
    async fn list_candidates(&self, query: &str, cap: usize) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut known: HashSet<String> = HashSet::new();
        let mut stagnant = 0u32;
        let mut pass = 0u32;

        while found.len() < cap && stagnant < STAGNATION_LIMIT {
            if self.interrupted() {
                break;
            }

            let before = found.len();
            match self.browser.search_page(query, pass).await {
                Ok(html) => {
                    for link in links::extract_links_by_pattern(&html, PLATFORM_BASE, "/video/") {
                        let identity = url_identity(&link);
                        if known.insert(identity.clone()) {
                            found.push(identity);
                            if found.len() >= cap {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    // A failed render is a stagnant cycle, not a dead run.
                    warn!(query, error = %e, "Search page render failed");
                }
            }

            if found.len() == before {
                stagnant += 1;
            } else {
                stagnant = 0;
            }
            pass += 1;
        }

        found
    }

    /// Visit one candidate: render, extract, score, then fire the enabled
    /// side effects. Failures degrade or skip this URL only.
    async fn visit(&self, url: &str, stats: &mut CollectStats) -> VisitOutcome {
        let html = match self.browser.video_page(url).await {
            Ok(html) if !html.trim().is_empty() => html,
            Ok(_) => {
                warn!(url, "Empty page content, skipping");
                return VisitOutcome::Failed;
            }
            Err(e) => {
                warn!(url, error = %e, "Page visit failed, skipping");
                return VisitOutcome::Failed;
            }
        };

        let record = extractor::extract_record(
            url,
            &html,
            self.options.comment_limit,
            self.options.scan_full_page,
        );

        if self.options.screenshots {
            match self.capture_screenshot(&record).await {
                SideEffectOutcome::Done => stats.screenshots += 1,
                SideEffectOutcome::Skipped => {}
                SideEffectOutcome::Failed(reason) => warn!(url, reason = reason.as_str(), "Screenshot failed"),
            }
        }

        if self.options.download_videos {
            match self.download_video(&record).await {
                SideEffectOutcome::Done => stats.downloads += 1,
                SideEffectOutcome::Skipped => {}
                SideEffectOutcome::Failed(reason) => warn!(url, reason = reason.as_str(), "Download failed"),
            }
        }

        if self.options.archive_snapshots {
            match self.archive_snapshot(&record).await {
                SideEffectOutcome::Done => stats.snapshots += 1,
                SideEffectOutcome::Skipped => {}
                SideEffectOutcome::Failed(reason) => warn!(url, reason = reason.as_str(), "Snapshot failed"),
            }
        }

        VisitOutcome::Collected(Box::new(record))
    }

    async fn capture_screenshot(&self, record: &VideoRecord) -> SideEffectOutcome {
        let Some(ref dir) = self.shots_dir else {
            return SideEffectOutcome::Skipped;
        };
        if record.video_id.is_empty() {
            return SideEffectOutcome::Skipped;
        }
        let bytes = match self.browser.screenshot(&record.url).await {
            Ok(bytes) => bytes,
            Err(e) => return SideEffectOutcome::Failed(e.to_string()),
        };
        let path = dir.join(format!("{}.png", record.video_id));
        match std::fs::write(&path, bytes) {
            Ok(()) => SideEffectOutcome::Done,
            Err(e) => SideEffectOutcome::Failed(e.to_string()),
        }
    }

    async fn download_video(&self, record: &VideoRecord) -> SideEffectOutcome {
        let Some(ref downloader) = self.downloader else {
            return SideEffectOutcome::Skipped;
        };
        match downloader.fetch(&record.url).await {
            Ok(()) => SideEffectOutcome::Done,
            Err(e) => SideEffectOutcome::Failed(e.to_string()),
        }
    }

    async fn archive_snapshot(&self, record: &VideoRecord) -> SideEffectOutcome {
        let Some(ref client) = self.snapshots else {
            return SideEffectOutcome::Skipped;
        };
        match client.save(&record.url).await {
            Ok(Some(snapshot)) => {
                info!(url = record.url.as_str(), snapshot = snapshot.as_str(), "Snapshot archived");
                SideEffectOutcome::Done
            }
            Ok(None) => SideEffectOutcome::Skipped,
            Err(e) => SideEffectOutcome::Failed(e.to_string()),
        }
    }
}

/// Rank hashtags across up to [`PIVOT_SAMPLE`] collected descriptions by
/// frequency (ties broken by first appearance) and return the top `n` as
/// synthetic search keywords.
fn top_hashtags(records: &[VideoRecord], n: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for record in records.iter().take(PIVOT_SAMPLE) {
        for tag in extract_hashtags(record.description.as_deref()) {
            let next_index = counts.len();
            let entry = counts.entry(tag).or_insert((0, next_index));
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(n)
        .map(|(tag, _)| format!("#{tag}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_description(desc: &str) -> VideoRecord {
        VideoRecord {
            description: Some(desc.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn top_hashtags_ranked_by_frequency() {
        let records = vec![
            record_with_description("#promo #gratis"),
            record_with_description("#promo #bonus"),
            record_with_description("#promo"),
        ];
        let tags = top_hashtags(&records, 2);
        assert_eq!(tags, vec!["#promo", "#gratis"]);
    }

    #[test]
    fn top_hashtags_empty_when_no_descriptions() {
        let records = vec![VideoRecord::default()];
        assert!(top_hashtags(&records, 5).is_empty());
    }

    #[test]
    fn top_hashtags_samples_bounded() {
        let mut records = Vec::new();
        for _ in 0..PIVOT_SAMPLE {
            records.push(record_with_description("#common"));
        }
        // Beyond the sample window; must not influence ranking.
        for _ in 0..50 {
            records.push(record_with_description("#latecomer"));
        }
        let tags = top_hashtags(&records, 5);
        assert_eq!(tags, vec!["#common"]);
    }
}
