//! Text normalization for scraped page content: shorthand engagement counts,
//! URL and hashtag extraction, and canonical video-URL identity parsing.
//!
//! Everything here is total: malformed input degrades to `None`/empty, never
//! an error. Scraped text is hostile by default.

use std::sync::LazyLock;

use regex::Regex;

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*([KkMmBb])?").expect("valid regex"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid regex"));

/// `&?#` so HTML entity artifacts (`&#123;`) are consumed and can be skipped;
/// the regex crate has no lookbehind.
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&?#(\w{2,64})").expect("valid regex"));

static VIDEO_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/@([^/?#]+)/video/(\d+)").expect("valid regex"));

/// Parse a shorthand engagement count like `1.2K`, `3,400` or `5M`.
///
/// Thousands separators are stripped first; a trailing magnitude suffix
/// multiplies (`k` ×1e3, `m` ×1e6, `b` ×1e9) and the result is truncated
/// toward zero. Unmatched input falls back to keeping only the digits.
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned = raw.replace(',', "");

    if let Some(caps) = COUNT_RE.captures(&cleaned) {
        let num: f64 = caps.get(1)?.as_str().parse().ok()?;
        let mult = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(s) if s == "k" => 1_000.0,
            Some(s) if s == "m" => 1_000_000.0,
            Some(s) if s == "b" => 1_000_000_000.0,
            _ => 1.0,
        };
        return Some((num * mult) as u64);
    }

    // Last resort: keep the digits, drop everything else.
    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Extract distinct `http(s)://` substrings in first-occurrence order.
/// Token-based, not a full URI grammar: whitespace, quotes and angle
/// brackets delimit.
pub fn extract_urls(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

/// Extract distinct hashtag tokens (2-64 word characters after `#`) in
/// first-occurrence order, case-sensitive. `#` preceded by `&` is an HTML
/// entity artifact, not a hashtag.
pub fn extract_hashtags(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();
    for m in HASHTAG_RE.find_iter(text) {
        if m.as_str().starts_with('&') {
            continue;
        }
        let tag = &m.as_str()[1..];
        if seen.insert(tag.to_string()) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Extract `(username, video_id)` from a canonical video page URL of the
/// shape `/@<username>/video/<digits>`. Both come from the one rule: no
/// match, or an unparseable URL, yields `(None, None)` — never a guess.
pub fn parse_video_url(url: &str) -> (Option<String>, Option<String>) {
    let Ok(parsed) = url::Url::parse(url) else {
        return (None, None);
    };
    match VIDEO_PATH_RE.captures(parsed.path()) {
        Some(caps) => (
            Some(caps[1].to_string()),
            Some(caps[2].to_string()),
        ),
        None => (None, None),
    }
}

/// A record's dedup identity: the URL with query string and fragment
/// stripped.
pub fn url_identity(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        // Not URL-shaped; best effort on the raw string.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- parse_count ---

    #[test]
    fn count_suffix_k() {
        assert_eq!(parse_count(Some("1.2K")), Some(1_200));
    }

    #[test]
    fn count_thousands_separator() {
        assert_eq!(parse_count(Some("3,400")), Some(3_400));
    }

    #[test]
    fn count_suffix_m() {
        assert_eq!(parse_count(Some("5M")), Some(5_000_000));
    }

    #[test]
    fn count_suffix_b() {
        assert_eq!(parse_count(Some("1.5B")), Some(1_500_000_000));
    }

    #[test]
    fn count_plain_integer() {
        assert_eq!(parse_count(Some("42")), Some(42));
    }

    #[test]
    fn count_empty_is_none() {
        assert_eq!(parse_count(Some("")), None);
        assert_eq!(parse_count(None), None);
    }

    #[test]
    fn count_garbage_is_none() {
        assert_eq!(parse_count(Some("abc")), None);
    }

    #[test]
    fn count_embedded_digits_fall_back() {
        // Falls through the shorthand pattern to the digit-stripping path.
        assert_eq!(parse_count(Some("~987 likes")), Some(987));
    }

    #[test]
    fn count_truncates_toward_zero() {
        assert_eq!(parse_count(Some("1.2345K")), Some(1_234));
    }

    // --- extract_urls ---

    #[test]
    fn urls_dedup_preserving_order() {
        let urls = extract_urls(Some("see http://a.co and http://a.co"));
        assert_eq!(urls, vec!["http://a.co"]);
    }

    #[test]
    fn urls_first_occurrence_order() {
        let urls = extract_urls(Some("http://b.co then https://a.co then http://b.co"));
        assert_eq!(urls, vec!["http://b.co", "https://a.co"]);
    }

    #[test]
    fn urls_quote_delimited() {
        let urls = extract_urls(Some(r#"<a href="https://x.co/p">x</a>"#));
        assert_eq!(urls, vec!["https://x.co/p"]);
    }

    #[test]
    fn urls_empty_input() {
        assert!(extract_urls(None).is_empty());
        assert!(extract_urls(Some("no links here")).is_empty());
    }

    // --- extract_hashtags ---

    #[test]
    fn hashtags_case_sensitive_distinct() {
        let tags = extract_hashtags(Some("#promo gratis #PROMO"));
        assert_eq!(tags, vec!["promo", "PROMO"]);
    }

    #[test]
    fn hashtags_entity_artifacts_excluded() {
        assert!(extract_hashtags(Some("&#123;")).is_empty());
    }

    #[test]
    fn hashtags_adjacent() {
        let tags = extract_hashtags(Some("#fyp#viral"));
        assert_eq!(tags, vec!["fyp", "viral"]);
    }

    #[test]
    fn hashtags_single_char_too_short() {
        assert!(extract_hashtags(Some("#a")).is_empty());
    }

    #[test]
    fn hashtags_empty_input() {
        assert!(extract_hashtags(None).is_empty());
    }

    // --- parse_video_url ---

    #[test]
    fn video_url_canonical_shape() {
        let (user, id) = parse_video_url("https://x.com/@alice/video/12345?x=1");
        assert_eq!(user.as_deref(), Some("alice"));
        assert_eq!(id.as_deref(), Some("12345"));
    }

    #[test]
    fn video_url_no_match() {
        assert_eq!(parse_video_url("https://x.com/nothing"), (None, None));
    }

    #[test]
    fn video_url_malformed_degrades() {
        assert_eq!(parse_video_url("not a url"), (None, None));
        assert_eq!(parse_video_url(""), (None, None));
    }

    #[test]
    fn video_url_missing_id_fails_whole_rule() {
        // Username alone is not enough — the rule matches both or neither.
        assert_eq!(parse_video_url("https://x.com/@alice"), (None, None));
    }

    // --- url_identity ---

    #[test]
    fn identity_strips_query() {
        assert_eq!(
            url_identity("https://x.com/@a/video/1?q=2&r=3"),
            "https://x.com/@a/video/1"
        );
    }

    #[test]
    fn identity_strips_fragment() {
        assert_eq!(
            url_identity("https://x.com/@a/video/1#comments"),
            "https://x.com/@a/video/1"
        );
    }

    #[test]
    fn identity_same_for_differing_queries() {
        assert_eq!(
            url_identity("https://x.com/@a/video/1?lang=en"),
            url_identity("https://x.com/@a/video/1?lang=id")
        );
    }
}
