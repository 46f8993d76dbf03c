//! Report writers: line-delimited records, a flat table, and a ranked HTML
//! report, all sharing one output basename.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use vidsift_common::{VideoRecord, ROW_FIELDS, RISK_FLAG_HIGH, RISK_FLAG_MEDIUM};

/// Write all three reports next to each other: `<base>.jsonl`,
/// `<base>.csv`, `<base>.html`. Returns the paths written.
pub fn write_reports(records: &[VideoRecord], base: &Path) -> Result<Vec<PathBuf>> {
    if let Some(parent) = base.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let jsonl = base.with_extension("jsonl");
    let csv = base.with_extension("csv");
    let html = base.with_extension("html");

    write_jsonl(records, &jsonl)?;
    write_csv(records, &csv)?;
    write_html(records, &html)?;

    for path in [&jsonl, &csv, &html] {
        info!(path = %path.display(), "Report written");
    }
    Ok(vec![jsonl, csv, html])
}

/// One serde_json record per line, collection order.
pub fn write_jsonl(records: &[VideoRecord], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Flat table with the full field set; composite fields flattened by
/// [`VideoRecord::to_row`].
pub fn write_csv(records: &[VideoRecord], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
    );

    writeln!(out, "{}", ROW_FIELDS.join(","))?;
    for record in records {
        let row: Vec<String> = record.to_row().iter().map(|f| csv_field(f)).collect();
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Quote a CSV field when it needs it; embedded quotes double.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Ranking for the human-readable report: risk score descending, ties
/// broken by like count descending. Missing like counts rank last.
pub fn ranked(records: &[VideoRecord]) -> Vec<&VideoRecord> {
    let mut sorted: Vec<&VideoRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then(b.like_count.unwrap_or(0).cmp(&a.like_count.unwrap_or(0)))
    });
    sorted
}

/// Ranked HTML report; rows at or above [`RISK_FLAG_HIGH`] are flagged
/// high, anything scoring at all is flagged medium.
pub fn write_html(records: &[VideoRecord], path: &Path) -> Result<()> {
    let html = render_report(records);
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn render_report(records: &[VideoRecord]) -> String {
    let mut rows = String::new();
    for record in ranked(records) {
        let tier = if record.risk_score >= RISK_FLAG_HIGH {
            "risk-high"
        } else if record.risk_score >= RISK_FLAG_MEDIUM {
            "risk-medium"
        } else {
            "risk-none"
        };
        let likes = record
            .like_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "—".to_string());
        rows.push_str(&format!(
            r#"<tr class="{tier}"><td>{score}</td><td><a href="{url}">{handle}</a></td><td>{likes}</td><td>{desc}</td><td>{matches}</td></tr>
"#,
            score = record.risk_score,
            url = html_escape(&record.url),
            handle = html_escape(
                record
                    .username
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .unwrap_or(&record.video_id)
            ),
            desc = html_escape(record.description.as_deref().unwrap_or("")),
            matches = html_escape(&record.risk_matches.join(", ")),
        ));
    }

    let content = format!(
        r#"<div class="container">
<h2>Collected videos — ranked by risk</h2>
<p class="count">{count} records · flagged high at score ≥ {high}</p>
<table>
<thead><tr><th>Risk</th><th>Video</th><th>Likes</th><th>Description</th><th>Matched indicators</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</div>"#,
        count = records.len(),
        high = RISK_FLAG_HIGH,
    );

    build_page("Vidsift Report", &content)
}

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.container{{max-width:1100px;margin:0 auto;padding:24px;}}
h2{{margin-bottom:8px;}}
.count{{color:#888;font-size:13px;margin-bottom:16px;}}
table{{width:100%;border-collapse:collapse;background:#fff;border:1px solid #e0e0e0;border-radius:8px;font-size:14px;}}
th,td{{padding:8px 12px;text-align:left;border-bottom:1px solid #eee;vertical-align:top;}}
th{{background:#f5f5f5;font-size:12px;text-transform:uppercase;color:#666;}}
tr.risk-high td:first-child{{background:#fce4ec;color:#c62828;font-weight:700;}}
tr.risk-medium td:first-child{{background:#fff3e0;color:#e65100;font-weight:600;}}
td a{{color:#0066cc;text-decoration:none;}}
td a:hover{{text-decoration:underline;}}
</style>
</head>
<body>
{content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(risk: u32, likes: Option<u64>) -> VideoRecord {
        VideoRecord {
            video_id: format!("vid-{risk}-{likes:?}"),
            url: format!("https://x.com/@u/video/{risk}"),
            risk_score: risk,
            like_count: likes,
            ..Default::default()
        }
    }

    #[test]
    fn ranking_is_risk_desc_then_likes_desc() {
        let records = vec![
            record(0, Some(9)),
            record(3, Some(1)),
            record(1, Some(5)),
            record(5, None),
        ];
        let scores: Vec<u32> = ranked(&records).iter().map(|r| r.risk_score).collect();
        assert_eq!(scores, vec![5, 3, 1, 0]);
    }

    #[test]
    fn ranking_ties_break_on_likes() {
        let records = vec![record(2, Some(10)), record(2, Some(500)), record(2, None)];
        let likes: Vec<Option<u64>> = ranked(&records).iter().map(|r| r.like_count).collect();
        assert_eq!(likes, vec![Some(500), Some(10), None]);
    }

    #[test]
    fn csv_field_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn html_flags_tiers() {
        let records = vec![record(5, None), record(1, None), record(0, None)];
        let html = render_report(&records);
        assert!(html.contains("risk-high"));
        assert!(html.contains("risk-medium"));
        assert!(html.contains("risk-none"));
    }

    #[test]
    fn html_escapes_description() {
        let mut rec = record(1, None);
        rec.description = Some("<script>alert(1)</script>".into());
        let html = render_report(&[rec]);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
