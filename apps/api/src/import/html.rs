//! HTML helpers for the import pipeline: page-break markers, heading text and
//! tag stripping. Parsing goes through `scraper` so entities are decoded the
//! way a browser would.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Opening tag of any element whose class names a page break
/// (`page-break`, `page_break`, `pagebreak`, any case, quoted or not).
static PAGE_BREAK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<[a-z][a-z0-9]*\b[^>]*\bclass\s*=\s*(?:["'][^"']*\bpage[-_]?break[^"']*["']|[^\s"'>]*\bpage[-_]?break[^\s"'>]*)[^>]*>"#,
    )
    .expect("page-break marker regex")
});

/// Closing block tags and `<br>`, after which a newline is inserted before stripping.
static BLOCK_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:p|div|h[1-6]|li|tr|table|section|article|blockquote|pre|ul|ol)\s*>|<br\s*/?>")
        .expect("block boundary regex")
});

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank line regex"));

pub fn has_page_break_markers(html: &str) -> bool {
    PAGE_BREAK_MARKER.is_match(html)
}

/// Splits HTML on page-break markers and returns the plain text of each fragment.
/// Empty fragments are kept; callers decide what to drop.
pub fn split_on_page_breaks(html: &str) -> Vec<String> {
    PAGE_BREAK_MARKER.split(html).map(html_to_text).collect()
}

/// Plain text of an HTML fragment, one line per block element.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_BOUNDARY.replace_all(html, "$0\n");
    let fragment = Html::parse_fragment(&with_breaks);
    let raw: String = fragment.root_element().text().collect();

    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    EXCESS_BLANK_LINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Text of every `h1`/`h2` in document order, whitespace-collapsed, empties dropped.
pub fn heading_texts(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("h1, h2") else {
        return Vec::new();
    };
    let doc = Html::parse_fragment(html);
    doc.select(&selector)
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect()
}
