//! Turns rendered video-page HTML into a [`VideoRecord`].
//!
//! Mining order mirrors how much structure each source has: JSON-LD blocks
//! first, `og:` meta tags as fallback, then raw-DOM heuristics (tag anchors).
//! Every step is best-effort; a page that yields nothing still produces a
//! record with its URL identity fields.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

use vidsift_common::normalize::{extract_hashtags, extract_urls, parse_count, parse_video_url};
use vidsift_common::{risk, Comment, VideoRecord};

static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

static OG_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*property\s*=\s*["']og:description["'][^>]*content\s*=\s*["']([^"']*)["']|<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*property\s*=\s*["']og:description["']"#,
    )
    .expect("valid regex")
});

static TAG_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["'][^"']*/tag/(\w{2,64})["']"#).expect("valid regex"));

/// `og:description` often carries counters as text: "1.2K Likes, 34 Comments."
static OG_LIKES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.,]+[kmb]?)\s+likes").expect("valid regex"));
static OG_COMMENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.,]+[kmb]?)\s+comments").expect("valid regex"));

/// Fields mined from structured page data before assembly.
#[derive(Debug, Default)]
struct PageFacts {
    description: Option<String>,
    upload_date: Option<String>,
    author_name: Option<String>,
    like_count: Option<u64>,
    comment_count: Option<u64>,
    share_count: Option<u64>,
    view_count: Option<u64>,
    comments: Vec<Comment>,
}

/// Build a record from a video page. `comment_limit` bounds collected
/// comments (0 skips them); `scan_full_page` widens URL extraction and risk
/// scoring from the description to Readability-extracted page text.
pub fn extract_record(
    url: &str,
    html: &str,
    comment_limit: usize,
    scan_full_page: bool,
) -> VideoRecord {
    let mut facts = PageFacts::default();

    for caps in JSON_LD_RE.captures_iter(html) {
        let Ok(data) = serde_json::from_str::<Value>(caps[1].trim()) else {
            continue;
        };
        mine_json_ld(&data, &mut facts, comment_limit);
    }

    // Meta tag fallback for the description and its embedded counters.
    if let Some(og_desc) = og_description(html) {
        if facts.like_count.is_none() {
            facts.like_count = OG_LIKES_RE
                .captures(&og_desc)
                .and_then(|c| parse_count(Some(&c[1])));
        }
        if facts.comment_count.is_none() {
            facts.comment_count = OG_COMMENTS_RE
                .captures(&og_desc)
                .and_then(|c| parse_count(Some(&c[1])));
        }
        if facts.description.is_none() {
            facts.description = Some(og_desc);
        }
    }

    // Hashtags: description text unioned with /tag/ anchors, stored sorted.
    let mut tags: std::collections::BTreeSet<String> = extract_hashtags(facts.description.as_deref())
        .into_iter()
        .collect();
    for caps in TAG_ANCHOR_RE.captures_iter(html) {
        tags.insert(caps[1].to_string());
    }

    let full_text = if scan_full_page {
        readable_text(url, html)
    } else {
        None
    };

    let risk_input = match (&facts.description, &full_text) {
        (Some(desc), Some(full)) => Some(format!("{desc}\n{full}")),
        (Some(desc), None) => Some(desc.clone()),
        (None, Some(full)) => Some(full.clone()),
        (None, None) => None,
    };
    let assessment = risk::score(risk_input.as_deref());

    let mut extracted_urls = extract_urls(facts.description.as_deref());
    if let Some(ref full) = full_text {
        for u in extract_urls(Some(full)) {
            if !extracted_urls.contains(&u) {
                extracted_urls.push(u);
            }
        }
    }

    let (username, video_id) = parse_video_url(url);

    VideoRecord {
        video_id: video_id.unwrap_or_default(),
        url: url.to_string(),
        username,
        author_name: facts.author_name,
        description: facts.description,
        upload_date: facts.upload_date.map(|d| normalize_date(&d)),
        like_count: facts.like_count,
        comment_count: facts.comment_count,
        share_count: facts.share_count,
        view_count: facts.view_count,
        hashtags: tags.into_iter().collect(),
        extracted_urls,
        comments: facts.comments,
        keyword_searched: String::new(),
        risk_score: assessment.score,
        risk_matches: assessment.matches,
    }
}

/// Walk a JSON-LD document (object or array of objects) for
/// VideoObject/SocialMediaPosting nodes.
fn mine_json_ld(data: &Value, facts: &mut PageFacts, comment_limit: usize) {
    let nodes: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    for node in nodes {
        let Some(obj) = node.as_object() else { continue };
        let node_type = obj.get("@type").and_then(Value::as_str).unwrap_or_default();
        if node_type != "VideoObject" && node_type != "SocialMediaPosting" {
            continue;
        }

        if facts.description.is_none() {
            facts.description = obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        if facts.upload_date.is_none() {
            facts.upload_date = obj
                .get("uploadDate")
                .or_else(|| obj.get("datePublished"))
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        if facts.author_name.is_none() {
            facts.author_name = obj
                .get("author")
                .and_then(|a| a.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        if let Some(stats) = obj.get("interactionStatistic").and_then(Value::as_array) {
            for stat in stats {
                let Some(count) = interaction_count(stat) else {
                    continue;
                };
                // The interactionType can be a string or a nested object;
                // serializing it flattens both cases for substring checks.
                let kind = stat
                    .get("interactionType")
                    .map(|t| t.to_string().to_lowercase())
                    .unwrap_or_default();
                if kind.contains("view") || kind.contains("watch") {
                    facts.view_count.get_or_insert(count);
                } else if kind.contains("like") {
                    facts.like_count.get_or_insert(count);
                } else if kind.contains("comment") {
                    facts.comment_count.get_or_insert(count);
                } else if kind.contains("share") {
                    facts.share_count.get_or_insert(count);
                }
            }
        }

        if comment_limit > 0 {
            if let Some(comments) = obj.get("comment").and_then(Value::as_array) {
                for c in comments {
                    if facts.comments.len() >= comment_limit {
                        break;
                    }
                    let Some(text) = c.get("text").and_then(Value::as_str) else {
                        continue;
                    };
                    let user = c
                        .get("author")
                        .and_then(|a| a.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    facts.comments.push(Comment {
                        user,
                        text: text.to_string(),
                    });
                }
            }
        }
    }
}

fn interaction_count(stat: &Value) -> Option<u64> {
    match stat.get("userInteractionCount")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_count(Some(s)),
        _ => None,
    }
}

fn og_description(html: &str) -> Option<String> {
    let caps = OG_DESC_RE.captures(html)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    if raw.is_empty() {
        return None;
    }
    Some(decode_entities(raw))
}

/// Minimal entity decoding for attribute values.
fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// RFC 3339 timestamps are normalized; anything else is kept verbatim.
fn normalize_date(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.to_rfc3339(),
        Err(_) => raw.to_string(),
    }
}

/// Readability extraction over the full page, for deep scan modes.
fn readable_text(url: &str, html: &str) -> Option<String> {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };
    let text = transform_content_input(input, &config);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
