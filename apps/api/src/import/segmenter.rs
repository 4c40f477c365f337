//! Document segmentation: splits imported text into ordered pages.
//!
//! Strategies run from most to least structure-aware; the first one that
//! produces pages wins:
//!
//! 1. form feeds in the plain text
//! 2. page-break markers in the HTML rendering
//! 3. headings (`h1`/`h2` from HTML, numbered/chapter/section lines from text),
//!    adopted only when they yield more than one page
//! 4. length: ~2000-character chunks cut at the nearest sentence end,
//!    paragraph break or newline
//!
//! Offsets are UTF-8 byte offsets into the plain text and always sit on char
//! boundaries; every length threshold is counted in characters.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::import::html::{has_page_break_markers, heading_texts, split_on_page_breaks};

/// Text at or under this length is always a single page.
pub const SINGLE_PAGE_MAX_CHARS: usize = 2200;
/// Preferred page length for the length-based fallback.
pub const CHUNK_TARGET_CHARS: usize = 2000;
/// Sentence ends are searched this far either side of the target.
const SENTENCE_WINDOW_CHARS: usize = 200;
/// A cut may run past the target by at most this much.
const MAX_OVERSHOOT_CHARS: usize = 100;
/// Text-detected headings within this many chars of an HTML heading are duplicates.
const HEADING_DEDUP_CHARS: usize = 50;

const FORM_FEED: char = '\u{000C}';

/// `Chapter 3 ...`, `Section IV ...`, `Part 2`, `1. Introduction`, `2.3 Results`.
static TEXT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?i:chapter|section|part)[ \t]+(?:\d+|(?i:[ivxlcdm]+))\b[^\n]{0,80}|\d{1,2}(?:\.\d{1,2})*\.?[ \t]+\p{Lu}[^\n]{0,80})[ \t]*$",
    )
    .expect("text heading regex")
});

/// Sentence punctuation followed by whitespace and a capital letter.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+\p{Lu}").expect("sentence end regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

impl Page {
    fn untitled(content: &str) -> Self {
        Self {
            title: None,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    FormFeed,
    HtmlPageBreaks,
    Headings,
    Length,
}

/// Splits `text` (with an optional HTML rendering) into pages. Never returns
/// an empty vector: empty input yields one page with empty content.
pub fn split_into_pages(text: &str, html: Option<&str>) -> Vec<Page> {
    split_with_strategy(text, html).1
}

/// Same as `split_into_pages`, also reporting which strategy produced the pages.
pub fn split_with_strategy(text: &str, html: Option<&str>) -> (SplitStrategy, Vec<Page>) {
    let (strategy, pages) = if let Some(pages) = split_on_form_feeds(text) {
        (SplitStrategy::FormFeed, pages)
    } else if let Some(pages) = html.and_then(split_on_html_markers) {
        (SplitStrategy::HtmlPageBreaks, pages)
    } else if let Some(pages) = split_on_headings(text, html) {
        (SplitStrategy::Headings, pages)
    } else {
        (SplitStrategy::Length, split_by_length(text))
    };

    debug!(
        "Segmented {} chars into {} page(s) via {:?}",
        text.chars().count(),
        pages.len(),
        strategy
    );
    (strategy, pages)
}

fn push_trimmed(pages: &mut Vec<Page>, title: Option<String>, segment: &str) {
    let content = segment.trim();
    if !content.is_empty() {
        pages.push(Page {
            title,
            content: content.to_string(),
        });
    }
}

fn non_empty(pages: Vec<Page>) -> Option<Vec<Page>> {
    (!pages.is_empty()).then_some(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// 1. Form feeds
// ────────────────────────────────────────────────────────────────────────────

fn split_on_form_feeds(text: &str) -> Option<Vec<Page>> {
    if !text.contains(FORM_FEED) {
        return None;
    }
    let mut pages = Vec::new();
    for segment in text.split(FORM_FEED) {
        push_trimmed(&mut pages, None, segment);
    }
    non_empty(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// 2. HTML page-break markers
// ────────────────────────────────────────────────────────────────────────────

fn split_on_html_markers(html: &str) -> Option<Vec<Page>> {
    if !has_page_break_markers(html) {
        return None;
    }
    let mut pages = Vec::new();
    for fragment in split_on_page_breaks(html) {
        push_trimmed(&mut pages, None, &fragment);
    }
    non_empty(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// 3. Headings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Boundary {
    offset: usize,
    title: Option<String>,
}

fn split_on_headings(text: &str, html: Option<&str>) -> Option<Vec<Page>> {
    let mut boundaries = html.map(|h| html_heading_boundaries(text, h)).unwrap_or_default();
    let html_offsets: Vec<usize> = boundaries.iter().map(|b| b.offset).collect();

    for m in TEXT_HEADING.find_iter(text) {
        let near_html = html_offsets
            .iter()
            .any(|&o| char_distance(text, o, m.start()) <= HEADING_DEDUP_CHARS);
        if !near_html {
            boundaries.push(Boundary {
                offset: m.start(),
                title: None,
            });
        }
    }

    if boundaries.is_empty() {
        return None;
    }

    // Stable sort keeps the titled HTML boundary first when offsets collide.
    boundaries.sort_by_key(|b| b.offset);
    boundaries.dedup_by_key(|b| b.offset);

    let mut pages = Vec::new();
    if boundaries[0].offset > 0 {
        push_trimmed(&mut pages, None, &text[..boundaries[0].offset]);
    }
    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).map_or(text.len(), |next| next.offset);
        push_trimmed(&mut pages, boundary.title.clone(), &text[boundary.offset..end]);
    }

    (pages.len() > 1).then_some(pages)
}

/// Locates each HTML heading in the plain text, scanning forward so later
/// headings land after earlier ones.
fn html_heading_boundaries(text: &str, html: &str) -> Vec<Boundary> {
    let mut boundaries = Vec::new();
    let mut cursor = 0;
    for title in heading_texts(html) {
        if let Some(offset) = locate_heading(text, &title, cursor) {
            // Step past this match so a repeated title finds its next occurrence.
            cursor = offset + text[offset..].chars().next().map_or(0, char::len_utf8);
            boundaries.push(Boundary {
                offset,
                title: Some(title),
            });
        }
    }
    boundaries
}

/// Case-insensitive search for `title`, preferring a match that starts a line.
/// Falls back to any match after `from`, then to the first match anywhere.
fn locate_heading(text: &str, title: &str, from: usize) -> Option<usize> {
    let words: Vec<String> = title.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let body = words.join(r"\s+");

    let at_line_start = RegexBuilder::new(&format!(r"(?m)^[ \t]*({body})"))
        .case_insensitive(true)
        .build()
        .ok()?;
    let anywhere = RegexBuilder::new(&body).case_insensitive(true).build().ok()?;

    at_line_start
        .captures_at(text, from)
        .and_then(|c| c.get(1))
        .map(|m| m.start())
        .or_else(|| anywhere.find_at(text, from).map(|m| m.start()))
        .or_else(|| anywhere.find(text).map(|m| m.start()))
}

fn char_distance(text: &str, a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    text[lo..hi].chars().count()
}

// ────────────────────────────────────────────────────────────────────────────
// 4. Length
// ────────────────────────────────────────────────────────────────────────────

fn split_by_length(text: &str) -> Vec<Page> {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SINGLE_PAGE_MAX_CHARS {
        return vec![Page::untitled(trimmed)];
    }

    let mut pages = Vec::new();
    let mut rest = trimmed;
    while rest.chars().count() > SINGLE_PAGE_MAX_CHARS {
        let cut = find_cut(rest);
        let (head, tail) = rest.split_at(cut);
        push_trimmed(&mut pages, None, head);
        rest = tail.trim_start();
    }
    push_trimmed(&mut pages, None, rest);
    pages
}

/// Byte offset of the `n`th char, or the end of the string.
fn byte_at_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Picks where the next chunk ends. `rest` is longer than one page, so the
/// result is always inside it and greater than zero.
fn find_cut(rest: &str) -> usize {
    let target = byte_at_char(rest, CHUNK_TARGET_CHARS);
    let limit = byte_at_char(rest, CHUNK_TARGET_CHARS + MAX_OVERSHOOT_CHARS);
    let window_start = byte_at_char(rest, CHUNK_TARGET_CHARS - SENTENCE_WINDOW_CHARS);
    let window_end = byte_at_char(rest, CHUNK_TARGET_CHARS + SENTENCE_WINDOW_CHARS);

    // The punctuation mark is ASCII, so the cut right after it is a char boundary.
    let sentence_cut = SENTENCE_END
        .find_iter(&rest[window_start..])
        .map(|m| window_start + m.start() + 1)
        .take_while(|&cut| cut <= window_end)
        .filter(|&cut| cut <= limit)
        .min_by_key(|&cut| char_distance(rest, cut, target));
    if let Some(cut) = sentence_cut {
        return cut;
    }

    let before_limit = &rest[..limit];
    if let Some(idx) = before_limit.rfind("\n\n").filter(|&i| i > 0) {
        return idx;
    }
    if let Some(idx) = before_limit.rfind('\n').filter(|&i| i > 0) {
        return idx;
    }
    target
}
