use quick_xml::{Reader, events::Event};

use std::{
    fmt::Display,
    io::{Cursor, Read},
};

use crate::models::DEFAULT_TITLE;

pub const PLAIN_TEXT: &str = "text/plain";
pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File is not valid UTF-8 text: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read Word document: {0}")]
    Docx(String),

    #[error("Text extraction aborted: {0}")]
    Aborted(String),

    #[error("File contains no text")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Matches on the media type essence, ignoring parameters such as charset.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PLAIN_TEXT => Some(Self::PlainText),
            PDF => Some(Self::Pdf),
            DOCX => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Collapses every whitespace run to one space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Filename without its last extension, or the default title.
pub fn title_from_filename(filename: Option<&str>) -> String {
    let name = filename.unwrap_or_default().trim();
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let stem = match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => &base[..idx],
        _ => base,
    };

    let stem = stem.trim();
    if stem.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        stem.to_string()
    }
}

pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let raw = match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())?,
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        DocumentKind::Docx => docx_text(bytes)?,
    };

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(text)
}

/// Resolves the content type and extracts text. PDF and DOCX parsing runs on
/// the blocking pool; a panic inside a parser surfaces as `Aborted`.
pub async fn extract_document(content_type: &str, bytes: Vec<u8>) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_content_type(content_type)
        .ok_or_else(|| ExtractError::UnsupportedFormat(content_type.to_string()))?;

    match kind {
        DocumentKind::PlainText => extract_text(kind, &bytes),
        DocumentKind::Pdf | DocumentKind::Docx => {
            tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
                .await
                .map_err(|e| ExtractError::Aborted(e.to_string()))?
        }
    }
}

fn docx_error(e: impl Display) -> ExtractError {
    ExtractError::Docx(e.to_string())
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(docx_error)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(docx_error)?
        .read_to_string(&mut xml)
        .map_err(docx_error)?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => out.push_str(&t.unescape().map_err(docx_error)?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}
