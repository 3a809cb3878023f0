//! # Digest Assembler
//! Pure, deterministic HTML rendering of summary results. No I/O.
//!
//! Notes are escaped first, then a small markdown subset is converted:
//! `#`-headings become `<h4>`, `**bold**` becomes `<b>`, `*em*` becomes `<i>`,
//! `* ` / `- ` bullets become `• `, and line breaks become `<br>`.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::model::{DigestDocument, SummaryBody, SummaryResult};

pub const STYLES: &str = r#"<style>
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; }
h1 { font-size: 24px; color: #2c3e50; font-weight: 600; }
h2 { font-size: 20px; color: #34495e; font-weight: 600; border-bottom: 1px solid #ecf0f1; padding-bottom: 5px; margin-top: 30px; }
h4 { font-size: 16px; color: #34495e; font-weight: 600; margin-bottom: 5px; }
p { font-size: 16px; margin-bottom: 10px; }
div.notes-block { background-color: #fdfdfd; border-left: 3px solid #3498db; padding: 10px 15px; margin-top: 10px; font-family: 'Georgia', serif; }
a { color: #3498db; text-decoration: none; }
hr { border: 0; border-top: 1px solid #ecf0f1; }
</style>"#;

pub const HEADER: &str = "<h1>🧠 Knowledge Curator Digest</h1>";

pub fn scheduled_subject(date: NaiveDate) -> String {
    format!("🧠 Knowledge Curator Digest: {}", date.format("%Y-%m-%d"))
}

pub fn on_demand_subject(title: &str) -> String {
    format!("Notes for: {title}")
}

/// Render the whole digest. Same input, same bytes.
pub fn assemble(subject: impl Into<String>, results: &[SummaryResult]) -> DigestDocument {
    let mut body = String::with_capacity(STYLES.len() + 512 * (results.len() + 1));
    body.push_str("<html><head><meta charset=\"utf-8\">");
    body.push_str(STYLES);
    body.push_str("</head><body>");
    body.push_str(HEADER);
    for r in results {
        body.push_str(&render_block(r));
    }
    body.push_str("</body></html>");

    DigestDocument {
        subject: subject.into(),
        body,
    }
}

/// One `<hr>`-separated block: title, link, notes or placeholder.
pub fn render_block(r: &SummaryResult) -> String {
    let title = html_escape::encode_text(&r.title);
    let href = html_escape::encode_double_quoted_attribute(&r.link);
    let link_text = html_escape::encode_text(&r.link);
    let notes = match &r.body {
        SummaryBody::Notes(n) => format_notes(n),
        SummaryBody::Placeholder(p) => format!("<i>{}</i>", html_escape::encode_text(p)),
    };
    format!(
        "\n<hr>\n<h2>{title}</h2>\n<p><b>🔗 Link:</b> <a href=\"{href}\">{link_text}</a></p>\n<div class=\"notes-block\">\n{notes}\n</div>\n"
    )
}

fn bold_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\*\*(\S(?:.*?\S)?)\*\*").unwrap())
}

fn em_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\*(\S(?:[^*]*?\S)?)\*").unwrap())
}

fn heading_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}(?:\s+(.*))?$").unwrap())
}

fn bullet_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[*\-]\s+(.*)$").unwrap())
}

fn inline(s: &str) -> String {
    let bolded = bold_re().replace_all(s, "<b>$1</b>");
    em_re().replace_all(&bolded, "<i>$1</i>").into_owned()
}

/// Convert model notes into presentation HTML.
pub fn format_notes(notes: &str) -> String {
    let mut out = String::with_capacity(notes.len() + 64);
    for raw in notes.replace("\r\n", "\n").split('\n') {
        let escaped = html_escape::encode_text(raw.trim());
        let line = escaped.as_ref();

        if let Some(caps) = heading_re().captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str().trim());
            out.push_str("<h4>");
            out.push_str(&inline(text));
            out.push_str("</h4>");
            continue;
        }
        if let Some(caps) = bullet_re().captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            out.push_str("• ");
            out.push_str(&inline(text));
        } else {
            out.push_str(&inline(line));
        }
        out.push_str("<br>");
    }
    while out.ends_with("<br>") {
        out.truncate(out.len() - "<br>".len());
    }
    out
}
