//! Minimal Markdown to HTML conversion for generated articles.
//!
//! Only the constructs the writer is asked to produce are handled: `#`–`###`
//! headings, `**bold**`, `> 💡 Tip:` boxes, plain blockquotes, `- ` lists and
//! blank-line separated paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static RE_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static RE_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_TIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> 💡 Tip: ?(.*)$").unwrap());
static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> (.*)$").unwrap());
static RE_LINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*|>[ \t]?|[-*][ \t]+)").unwrap());
static RE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+").unwrap());
static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

pub fn to_html(markdown: &str) -> String {
    let html = markdown.replace("\r\n", "\n");

    let html = RE_H3.replace_all(&html, "<h3>${1}</h3>");
    let html = RE_H2.replace_all(&html, "<h2>${1}</h2>");
    let html = RE_H1.replace_all(&html, "<h1>${1}</h1>");
    let html = RE_BOLD.replace_all(&html, "<strong>${1}</strong>");
    let html = RE_TIP.replace_all(
        &html,
        "<div class=\"tip-box\">💡 <strong>Tip:</strong> ${1}</div>",
    );
    let html = RE_QUOTE.replace_all(&html, "<blockquote>${1}</blockquote>");

    let html = wrap_lists(&html);

    html.split("\n\n")
        .map(|block| {
            let block = block.trim();
            if !block.is_empty() && !block.starts_with('<') {
                format!("<p>{}</p>", block)
            } else {
                block.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap_lists(html: &str) -> String {
    let mut lines = Vec::new();
    let mut in_list = false;

    for line in html.lines() {
        if let Some(item) = line.trim().strip_prefix("- ") {
            if !in_list {
                lines.push("<ul>".to_string());
                in_list = true;
            }
            lines.push(format!("  <li>{}</li>", item));
        } else {
            if in_list {
                lines.push("</ul>".to_string());
                in_list = false;
            }
            lines.push(line.to_string());
        }
    }

    if in_list {
        lines.push("</ul>".to_string());
    }

    lines.join("\n")
}

/// Plain-text summary of an article with Markdown markers removed, cut at a
/// sentence boundary when possible
pub fn extract_description(content: &str, max_chars: usize) -> String {
    let text = RE_LINE_MARKER.replace_all(content, "");
    let text = RE_EMPHASIS.replace_all(&text, "");
    let text = RE_NEWLINES.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut description = String::new();
    let mut length = 0;
    for sentence in text.split_inclusive(['.', '。', '!', '?']) {
        let sentence_len = sentence.chars().count();
        if length + sentence_len > max_chars {
            break;
        }
        description.push_str(sentence);
        length += sentence_len;
    }

    let description = description.trim();
    if description.is_empty() {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        description.to_string()
    }
}

/// Estimated reading time at 200 words per minute, at least one minute
pub fn read_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count() as f64;
    ((words / 200.0).round() as u32).max(1)
}
