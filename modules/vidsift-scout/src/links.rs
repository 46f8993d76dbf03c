use std::sync::LazyLock;

use regex::Regex;

/// Matches `href` attributes — the only semantic "link" in HTML.
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

/// Resolve a raw href against a base URL, returning an absolute URL with
/// fragment stripped.
fn resolve_href(raw: &str, base: Option<&url::Url>) -> Option<String> {
    let mut parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        url::Url::parse(raw).ok()?
    } else {
        base?.join(raw).ok()?
    };
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Extract links from raw HTML whose resolved URL contains `pattern`.
/// Only `href` attributes count; relative hrefs resolve against `base_url`;
/// results are deduplicated in first-occurrence order.
pub fn extract_links_by_pattern(html: &str, base_url: &str, pattern: &str) -> Vec<String> {
    let base = url::Url::parse(base_url).ok();
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for cap in HREF_RE.captures_iter(html) {
        let raw = &cap[1];
        if let Some(resolved) = resolve_href(raw, base.as_ref()) {
            if resolved.contains(pattern) && seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_hrefs_are_extracted() {
        let html = r#"<a href="https://x.com/@a/video/1">one</a>
            <a href="https://x.com/@a">profile</a>"#;
        let links = extract_links_by_pattern(html, "https://x.com/search", "/video/");
        assert_eq!(links, vec!["https://x.com/@a/video/1"]);
    }

    #[test]
    fn relative_hrefs_resolve_against_base() {
        let html = r#"<a href="/@b/video/22">two</a>"#;
        let links = extract_links_by_pattern(html, "https://x.com/search?q=scam", "/video/");
        assert_eq!(links, vec!["https://x.com/@b/video/22"]);
    }

    #[test]
    fn duplicates_collapse_preserving_order() {
        let html = r#"
            <a href="https://x.com/@a/video/1">one</a>
            <a href="https://x.com/@b/video/2">two</a>
            <a href="https://x.com/@a/video/1">one again</a>
        "#;
        let links = extract_links_by_pattern(html, "https://x.com", "/video/");
        assert_eq!(
            links,
            vec!["https://x.com/@a/video/1", "https://x.com/@b/video/2"]
        );
    }

    #[test]
    fn single_quoted_href() {
        let html = "<a href='https://x.com/@c/video/3'>three</a>";
        let links = extract_links_by_pattern(html, "https://x.com", "/video/");
        assert_eq!(links, vec!["https://x.com/@c/video/3"]);
    }

    #[test]
    fn fragment_is_stripped() {
        let html = r##"<a href="https://x.com/@a/video/1#comments">one</a>"##;
        let links = extract_links_by_pattern(html, "https://x.com", "/video/");
        assert_eq!(links, vec!["https://x.com/@a/video/1"]);
    }

    #[test]
    fn plain_text_urls_are_not_extracted() {
        let html = "watch https://x.com/@a/video/1 now";
        assert!(extract_links_by_pattern(html, "https://x.com", "/video/").is_empty());
    }

    #[test]
    fn empty_html_returns_empty() {
        assert!(extract_links_by_pattern("", "https://x.com", "/video/").is_empty());
    }

    #[test]
    fn malformed_base_url_skips_relative_hrefs() {
        let html = r#"<a href="/@a/video/1">one</a>"#;
        assert!(extract_links_by_pattern(html, "not a url", "/video/").is_empty());
    }
}
