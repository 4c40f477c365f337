//! Placeholder detection: decides whether a CV field holds real user input
//! or leftover template filler.
//!
//! Two strictness levels exist:
//! - text blocks (summary, bullets) are placeholder when empty, shorter than
//!   10 characters, or a short string containing a template phrase;
//! - short values (names, titles, skills, contact fields) skip the length
//!   floor, since "Rust" or "a@b.io" are legitimate.

use std::sync::LazyLock;

use regex::Regex;

/// Text blocks shorter than this are always filler.
const MIN_TEXT_CHARS: usize = 10;

/// Template phrases only disqualify strings shorter than this.
const PHRASE_CHECK_MAX_CHARS: usize = 30;

/// Matched as whole words anywhere in a short string.
const PLACEHOLDER_PHRASES: &[&str] = &[
    "lorem ipsum",
    "i work hard",
    "hard worker",
    "hardworking",
    "team player",
    "your name",
    "your email",
    "your phone",
    "your company",
    "your skill",
    "company name",
    "job title",
    "school name",
    "degree name",
    "skill example",
    "example skill",
    "sample text",
    "insert here",
    "john doe",
    "jane doe",
    "add a bullet",
    "describe your",
];

/// Generic filler that only counts when it is the entire value, so
/// "Sample preparation" or "Insert molding" stay real.
const FILLER_VALUES: &[&str] = &[
    "example",
    "sample",
    "insert",
    "placeholder",
    "tbd",
    "n/a",
    "xxx",
    "todo",
];

/// Emails copied straight from CV templates.
const TEMPLATE_EMAILS: &[&str] = &[
    "email@example.com",
    "name@example.com",
    "you@example.com",
    "your.email@example.com",
    "your@email.com",
];

static TEMPLATE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = PLACEHOLDER_PHRASES.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("template phrase regex")
});

fn contains_template_phrase(trimmed: &str) -> bool {
    if trimmed.chars().count() >= PHRASE_CHECK_MAX_CHARS {
        return false;
    }
    let lower = trimmed.to_lowercase();
    let bare = lower.trim_matches(|c: char| !c.is_alphanumeric() && c != '/');
    FILLER_VALUES.contains(&bare)
        || TEMPLATE_EMAILS.contains(&lower.as_str())
        || TEMPLATE_PHRASE.is_match(&lower)
}

/// Summary and bullet check.
pub fn is_placeholder_text(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty()
        || trimmed.chars().count() < MIN_TEXT_CHARS
        || contains_template_phrase(trimmed)
}

/// Name, title, skill and contact check.
pub fn is_placeholder_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || contains_template_phrase(trimmed)
}

/// Counts words carrying at least one letter or digit. Placeholder text counts zero.
pub fn real_word_count(text: &str) -> usize {
    if is_placeholder_text(text) {
        return 0;
    }
    count_words(text)
}

pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}
