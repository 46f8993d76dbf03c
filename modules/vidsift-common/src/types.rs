use serde::{Deserialize, Serialize};

/// One collected comment, best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user: Option<String>,
    pub text: String,
}

/// One collected short-video item, fully populated in a single pass.
/// `keyword_searched` is the only field set late, by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Platform-assigned ID; empty when the URL didn't parse.
    pub video_id: String,
    pub url: String,
    pub username: Option<String>,
    pub author_name: Option<String>,
    pub description: Option<String>,
    /// ISO-ish upload timestamp, best-effort.
    pub upload_date: Option<String>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub share_count: Option<u64>,
    pub view_count: Option<u64>,
    /// Sorted, deduplicated (case-sensitive).
    pub hashtags: Vec<String>,
    /// First-seen order, deduplicated.
    pub extracted_urls: Vec<String>,
    pub comments: Vec<Comment>,
    /// Comma-joined keywords of the run that produced this record.
    pub keyword_searched: String,
    pub risk_score: u32,
    /// Distinct matched indicators, insertion order.
    pub risk_matches: Vec<String>,
}

/// Column order for the flat tabular export. Matches `to_row`.
pub const ROW_FIELDS: &[&str] = &[
    "video_id",
    "url",
    "username",
    "author_name",
    "description",
    "upload_date",
    "like_count",
    "comment_count",
    "share_count",
    "view_count",
    "hashtags",
    "extracted_urls",
    "comments",
    "keyword_searched",
    "risk_score",
    "risk_matches",
];

impl VideoRecord {
    /// The record's dedup identity (URL minus query/fragment).
    pub fn identity(&self) -> String {
        crate::normalize::url_identity(&self.url)
    }

    /// Flatten to one table row: composite fields become delimited strings
    /// (hashtags/matches comma-joined, URLs space-joined, comments
    /// pipe-joined `user: text` pairs).
    pub fn to_row(&self) -> Vec<String> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let num = |v: &Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        let comments = self
            .comments
            .iter()
            .map(|c| match &c.user {
                Some(user) => format!("{user}: {}", c.text),
                None => c.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" | ");

        vec![
            self.video_id.clone(),
            self.url.clone(),
            opt(&self.username),
            opt(&self.author_name),
            opt(&self.description),
            opt(&self.upload_date),
            num(&self.like_count),
            num(&self.comment_count),
            num(&self.share_count),
            num(&self.view_count),
            self.hashtags.join(","),
            self.extracted_urls.join(" "),
            comments,
            self.keyword_searched.clone(),
            self.risk_score.to_string(),
            self.risk_matches.join(","),
        ]
    }
}

// --- Investigation modes ---

/// Depth preset for a collection run. Each mode is sugar for a bundle of
/// [`RunOptions`] flags; the orchestrator only ever sees the resolved form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationMode {
    Quick,
    Moderate,
    Deep,
    Deeper,
}

impl std::fmt::Display for InvestigationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestigationMode::Quick => write!(f, "quick"),
            InvestigationMode::Moderate => write!(f, "moderate"),
            InvestigationMode::Deep => write!(f, "deep"),
            InvestigationMode::Deeper => write!(f, "deeper"),
        }
    }
}

impl InvestigationMode {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "moderate" => Self::Moderate,
            "deep" => Self::Deep,
            "deeper" => Self::Deeper,
            _ => Self::Quick,
        }
    }

    /// Resolve the preset into a fully concrete option set. Pure: the same
    /// mode and limit always produce the same options.
    pub fn resolve(self, limit: usize) -> RunOptions {
        let base = RunOptions {
            limit,
            per_keyword_limit: None,
            screenshots: false,
            download_videos: false,
            archive_snapshots: false,
            comment_limit: 0,
            pivot_tags: 0,
            scan_full_page: false,
        };
        match self {
            InvestigationMode::Quick => base,
            InvestigationMode::Moderate => RunOptions {
                screenshots: true,
                comment_limit: 10,
                ..base
            },
            InvestigationMode::Deep => RunOptions {
                screenshots: true,
                archive_snapshots: true,
                comment_limit: 25,
                pivot_tags: 5,
                scan_full_page: true,
                ..base
            },
            InvestigationMode::Deeper => RunOptions {
                screenshots: true,
                archive_snapshots: true,
                download_videos: true,
                comment_limit: 50,
                pivot_tags: 10,
                scan_full_page: true,
                ..base
            },
        }
    }
}

/// Fully resolved collection options. Built from an [`InvestigationMode`]
/// preset plus explicit CLI overrides, before orchestration starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Global record cap across all keywords.
    pub limit: usize,
    /// Explicit per-keyword candidate cap; `None` distributes `limit`
    /// evenly across keywords.
    pub per_keyword_limit: Option<usize>,
    pub screenshots: bool,
    pub download_videos: bool,
    pub archive_snapshots: bool,
    /// Max comments kept per record; 0 skips comment extraction.
    pub comment_limit: usize,
    /// Top-N discovered hashtags promoted to pivot keywords; 0 disables.
    pub pivot_tags: usize,
    /// Widen URL extraction and risk scoring to Readability page text.
    pub scan_full_page: bool,
}
