//! Upload decoding: turn the bytes of a `.txt`, `.docx` or `.pdf` upload into
//! canonical text.
//!
//! Decoding is pure. Every failure is reported as a typed [`SkrivError`]; no
//! partial text is ever returned.

use crate::error::SkrivError;
use crate::pipeline::font::decode_winansi;
use lopdf::content::Content;
use lopdf::{Document as PdfDocument, Object};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PDF: &str = "application/pdf";

/// The three document formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    PlainText,
    Docx,
    Pdf,
}

impl MediaType {
    /// Match a declared MIME type. Parameters (`; charset=utf-8`) are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            MIME_TEXT => Some(MediaType::PlainText),
            MIME_DOCX => Some(MediaType::Docx),
            MIME_PDF => Some(MediaType::Pdf),
            _ => None,
        }
    }

    /// Match a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" => Some(MediaType::PlainText),
            "docx" => Some(MediaType::Docx),
            "pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::PlainText => MIME_TEXT,
            MediaType::Docx => MIME_DOCX,
            MediaType::Pdf => MIME_PDF,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaType::PlainText => "txt",
            MediaType::Docx => "docx",
            MediaType::Pdf => "pdf",
        }
    }

    /// Short label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            MediaType::PlainText => "plain text",
            MediaType::Docx => "DOCX",
            MediaType::Pdf => "PDF",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Decode `bytes` declared as `declared_media_type` into canonical text.
///
/// # Errors
/// * [`SkrivError::UnsupportedFormat`] for anything but text/plain, DOCX and
///   PDF; no decode is attempted.
/// * [`SkrivError::CorruptDocument`] when the bytes cannot be read as the
///   declared format.
pub fn decode(bytes: &[u8], declared_media_type: &str) -> Result<String, SkrivError> {
    let media_type =
        MediaType::from_mime(declared_media_type).ok_or_else(|| SkrivError::UnsupportedFormat {
            media_type: declared_media_type.to_string(),
        })?;
    decode_as(bytes, media_type)
}

/// Decode `bytes` as an already-resolved [`MediaType`].
pub fn decode_as(bytes: &[u8], media_type: MediaType) -> Result<String, SkrivError> {
    debug!("Decoding {} bytes as {}", bytes.len(), media_type.label());
    let text = match media_type {
        MediaType::PlainText => decode_plain(bytes)?,
        MediaType::Docx => decode_docx(bytes)?,
        MediaType::Pdf => decode_pdf(bytes)?,
    };
    info!(
        "Decoded {} document: {} chars",
        media_type.label(),
        text.chars().count()
    );
    Ok(text)
}

fn decode_plain(bytes: &[u8]) -> Result<String, SkrivError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| SkrivError::CorruptDocument {
        format: MediaType::PlainText.label(),
        detail: format!("not valid UTF-8: {e}"),
    })
}

// ── DOCX ──────────────────────────────────────────────────────────────────

fn decode_docx(bytes: &[u8]) -> Result<String, SkrivError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| SkrivError::CorruptDocument {
        format: MediaType::Docx.label(),
        detail: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(para) => {
                let mut out = String::new();
                for pc in &para.children {
                    paragraph_child_text(pc, &mut out);
                }
                Some(out)
            }
            // Tables, section properties, bookmarks: not part of the raw text.
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n\n"))
}

fn paragraph_child_text(child: &docx_rs::ParagraphChild, out: &mut String) {
    match child {
        docx_rs::ParagraphChild::Run(run) => {
            for rc in &run.children {
                match rc {
                    docx_rs::RunChild::Text(text) => out.push_str(&text.text),
                    docx_rs::RunChild::Break(_) => out.push('\n'),
                    docx_rs::RunChild::Tab(_) => out.push('\t'),
                    _ => {}
                }
            }
        }
        docx_rs::ParagraphChild::Hyperlink(link) => {
            for inner in &link.children {
                paragraph_child_text(inner, out);
            }
        }
        _ => {}
    }
}

// ── PDF ───────────────────────────────────────────────────────────────────

fn corrupt_pdf(detail: impl Into<String>) -> SkrivError {
    SkrivError::CorruptDocument {
        format: MediaType::Pdf.label(),
        detail: detail.into(),
    }
}

fn decode_pdf(bytes: &[u8]) -> Result<String, SkrivError> {
    // lopdf can panic on malformed object streams; treat that as corruption.
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| extract_pdf_items(bytes))) {
        Ok(result) => result.map(|items| items.join(" ")),
        Err(_) => {
            warn!("PDF parser panicked, reporting document as corrupt");
            Err(corrupt_pdf("parser panicked on malformed content"))
        }
    }
}

/// All text items of the document, in page order.
fn extract_pdf_items(bytes: &[u8]) -> Result<Vec<String>, SkrivError> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| corrupt_pdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(corrupt_pdf("document is encrypted"));
    }

    let pages = doc.get_pages();
    debug!("PDF has {} page(s)", pages.len());

    let mut items = Vec::new();
    // BTreeMap keys are 1-based page numbers, so iteration is in page order.
    for (page_num, page_id) in pages {
        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| corrupt_pdf(format!("page {page_num}: {e}")))?;
        let content =
            Content::decode(&raw).map_err(|e| corrupt_pdf(format!("page {page_num}: {e}")))?;

        for op in &content.operations {
            if matches!(op.operator.as_str(), "Tj" | "TJ" | "'" | "\"") {
                for operand in &op.operands {
                    if let Some(text) = string_operand(operand) {
                        if !text.is_empty() {
                            items.push(text);
                        }
                    }
                }
            }
        }
    }
    Ok(items)
}

/// Text of a string operand, or of the strings inside a `TJ` array.
fn string_operand(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Array(parts) => {
            let joined: String = parts.iter().filter_map(string_operand).collect();
            Some(joined)
        }
        _ => None,
    }
}

/// UTF-16BE when the string carries a BOM, WinAnsi otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        decode_winansi(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parameters_are_ignored() {
        assert_eq!(
            MediaType::from_mime("text/plain; charset=utf-8"),
            Some(MediaType::PlainText)
        );
        assert_eq!(MediaType::from_mime("Application/PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("image/png"), None);
    }

    #[test]
    fn extensions() {
        assert_eq!(MediaType::from_extension(".DOCX"), Some(MediaType::Docx));
        assert_eq!(MediaType::from_extension("txt"), Some(MediaType::PlainText));
        assert_eq!(MediaType::from_extension("odt"), None);
    }

    #[test]
    fn plain_text_is_verbatim() {
        let text = "Hej!\r\n  Åsa  \n";
        assert_eq!(decode(text.as_bytes(), "text/plain").unwrap(), text);
    }

    #[test]
    fn unsupported_format_is_rejected_before_decoding() {
        let err = decode(b"\x89PNG", "image/png").unwrap_err();
        assert!(matches!(err, SkrivError::UnsupportedFormat { media_type } if media_type == "image/png"));
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let err = decode(&[0xff, 0xfe, 0x00], MIME_TEXT).unwrap_err();
        assert!(matches!(err, SkrivError::CorruptDocument { .. }));
    }

    #[test]
    fn garbage_docx_is_corrupt() {
        let err = decode(b"definitely not a zip", MIME_DOCX).unwrap_err();
        assert!(matches!(err, SkrivError::CorruptDocument { format: "DOCX", .. }));
    }

    #[test]
    fn garbage_pdf_is_corrupt() {
        let err = decode(b"%PDF-1.4 truncated", MIME_PDF).unwrap_err();
        assert!(matches!(err, SkrivError::CorruptDocument { format: "PDF", .. }));
    }

    #[test]
    fn utf16_strings_decode() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x01, 0x0D];
        assert_eq!(decode_pdf_string(&bytes), "Hč");
    }

    #[test]
    fn tj_arrays_concatenate() {
        let obj = Object::Array(vec![
            Object::string_literal("Hel"),
            Object::Integer(-120),
            Object::string_literal("lo"),
        ]);
        assert_eq!(string_operand(&obj).as_deref(), Some("Hello"));
    }
}
