//! crates/englishhub_core/src/markup.rs
//!
//! Text helpers for rendering lesson content: HTML escaping, the lightweight
//! markup used by the editor preview, and relative timestamps for comments.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,3}) (.*)$").unwrap());
static QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^&gt; (.*)$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(?:- |\d+\. )(.*)$").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders editor markup to HTML. The input is escaped first, so the only
/// tags in the output are the ones produced here.
pub fn render_preview(text: &str) -> String {
    let escaped = escape_html(&text.replace('\r', ""));

    let html = HEADING.replace_all(&escaped, |caps: &regex::Captures| {
        let level = caps[1].len();
        format!("<h{level}>{}</h{level}>", &caps[2])
    });
    let html = QUOTE.replace_all(&html, "<blockquote>$1</blockquote>");
    let html = LIST_ITEM.replace_all(&html, "<li>$1</li>");
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC.replace_all(&html, "<em>$1</em>");
    let html = CODE.replace_all(&html, "<code>$1</code>");
    html.replace('\n', "<br>")
}

/// "Just now", "3 hours ago", "2 days ago", then the calendar date.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - then).num_hours();
    if hours < 1 {
        return "Just now".to_string();
    }
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 7 {
        return plural(days, "day");
    }
    then.format("%d/%m/%Y").to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
