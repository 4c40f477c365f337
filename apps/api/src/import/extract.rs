//! Text extraction for uploaded documents.
//!
//! Produces the plain text the segmenter works on plus, where the format
//! carries structure, an HTML rendering with `h1`/`h2` headings and
//! `<div class="page-break">` markers.
//!
//! All functions here are CPU-bound; callers run them inside
//! `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::errors::AppError;
use crate::import::html::html_to_text;

/// Extracted text shorter than this (after trimming) is rejected before segmentation.
pub const MIN_IMPORT_CHARS: usize = 50;

const PAGE_BREAK_HTML: &str = "<div class=\"page-break\"></div>";

/// A self-closing `<w:p .../>` is an empty paragraph and must not swallow the next one.
static DOCX_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?/>|<w:p(?:\s[^>]*)?>.*?</w:p>").expect("docx paragraph regex")
});

static DOCX_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<w:pStyle\s+w:val="([^"]+)""#).expect("docx style regex"));

/// Runs of text, tabs, line breaks and page breaks inside one paragraph.
static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:br\s+[^>]*w:type="page"[^>]*/>|<w:br\s*/>|<w:cr\s*/>"#)
        .expect("docx token regex")
});

static XML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("xml entity regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Html,
}

impl DocumentKind {
    /// Detects the format from the file extension, falling back to the content type.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        let by_extension = match extension.as_deref() {
            Some("pdf") => Some(DocumentKind::Pdf),
            Some("docx") => Some(DocumentKind::Docx),
            Some("txt" | "md") => Some(DocumentKind::PlainText),
            Some("html" | "htm") => Some(DocumentKind::Html),
            _ => None,
        };
        by_extension.or_else(|| {
            let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
            match mime.as_str() {
                "application/pdf" => Some(DocumentKind::Pdf),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                    Some(DocumentKind::Docx)
                }
                "text/plain" | "text/markdown" => Some(DocumentKind::PlainText),
                "text/html" => Some(DocumentKind::Html),
                _ => None,
            }
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::PlainText => "txt",
            DocumentKind::Html => "html",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Html => "text/html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub html: Option<String>,
}

pub fn extract_document(kind: DocumentKind, bytes: &[u8]) -> Result<ExtractedDocument> {
    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::PlainText => Ok(ExtractedDocument {
            text: decode_utf8(bytes),
            html: None,
        }),
        DocumentKind::Html => {
            let html = decode_utf8(bytes);
            Ok(ExtractedDocument {
                text: html_to_text(&html),
                html: Some(html),
            })
        }
    }
}

/// Rejects documents with too little text to be worth segmenting.
pub fn ensure_enough_text(doc: &ExtractedDocument) -> Result<(), AppError> {
    let chars = doc.text.trim().chars().count();
    if chars < MIN_IMPORT_CHARS {
        return Err(AppError::ImportTextTooShort { chars });
    }
    Ok(())
}

fn decode_utf8(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string()
}

fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument> {
    // pdf-extract panics on some malformed inputs; surface those as errors.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| anyhow!("PDF parser panicked"))?
        .map_err(|e| anyhow!("PDF text extraction failed: {e:?}"))?;
    Ok(ExtractedDocument { text, html: None })
}

fn extract_docx(bytes: &[u8]) -> Result<ExtractedDocument> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("DOCX file is not a valid archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX file has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read DOCX body")?;
    Ok(docx_body_to_document(&xml))
}

#[derive(Default)]
struct DocxWriter {
    text: String,
    html: String,
}

impl DocxWriter {
    fn line(&mut self, tag: &str, content: &str) {
        self.text.push_str(content);
        self.text.push('\n');
        if !content.trim().is_empty() {
            self.html
                .push_str(&format!("<{tag}>{}</{tag}>", escape_html(content).replace('\n', "<br>")));
        }
    }

    fn page_break(&mut self) {
        self.text.push('\u{000C}');
        self.html.push_str(PAGE_BREAK_HTML);
    }
}

/// Converts `word/document.xml` into plain text and a light HTML rendering.
fn docx_body_to_document(xml: &str) -> ExtractedDocument {
    let mut out = DocxWriter::default();

    for paragraph in DOCX_PARAGRAPH.find_iter(xml) {
        let paragraph = paragraph.as_str();
        let tag = DOCX_STYLE
            .captures(paragraph)
            .map_or("p", |c| heading_tag(&c[1]));

        let mut line = String::new();
        for token in DOCX_TOKEN.captures_iter(paragraph) {
            if let Some(run) = token.get(1) {
                line.push_str(&decode_xml_entities(run.as_str()));
                continue;
            }
            let raw = &token[0];
            if raw.starts_with("<w:tab") {
                line.push('\t');
            } else if raw.contains("page") {
                out.line(tag, &line);
                line.clear();
                out.page_break();
            } else {
                line.push('\n');
            }
        }
        out.line(tag, &line);
    }

    ExtractedDocument {
        text: out.text.trim_end().to_string(),
        html: Some(out.html),
    }
}

fn heading_tag(style: &str) -> &'static str {
    let normalized: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "title" | "heading1" => "h1",
        "subtitle" | "heading2" => "h2",
        _ => "p",
    }
}

fn decode_xml_entities(s: &str) -> String {
    XML_ENTITY
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse::<u32>())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
