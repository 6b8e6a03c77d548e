//! Export: serialise the document and its suggestions as plain text, DOCX or a
//! paginated PDF.
//!
//! Encoders are pure with respect to their inputs; the only side effect in
//! this module is [`write_artifact`], which persists an already-built
//! artifact atomically.

use crate::document::{Document, Suggestion};
use crate::error::SkrivError;
use crate::pipeline::decode::MediaType;
use crate::pipeline::font::encode_winansi;
use crate::pipeline::layout::{paginate, LineRole, PdfLayout};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, StringFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Export targets are exactly the upload formats.
pub type ExportFormat = MediaType;

/// Default file base name for exports.
pub const DEFAULT_BASE_NAME: &str = "skrivsmart_dokument";

/// A serialised export, handed to the caller and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub filename: String,
}

/// Encode `document` (and, for DOCX and PDF, `suggestions`) as `format`.
pub fn encode(
    document: &Document,
    suggestions: &[Suggestion],
    format: ExportFormat,
    base_name: &str,
    layout: &PdfLayout,
) -> Result<ExportArtifact, SkrivError> {
    let bytes = match format {
        MediaType::PlainText => document.text.as_bytes().to_vec(),
        MediaType::Docx => encode_docx(&document.text, suggestions)?,
        MediaType::Pdf => encode_pdf(&document.text, suggestions, layout)?,
    };
    let filename = format!("{}.{}", base_name, format.extension());
    info!(
        "Encoded {} export '{}' ({} bytes, {} suggestion(s))",
        format.label(),
        filename,
        bytes.len(),
        suggestions.len()
    );
    Ok(ExportArtifact {
        bytes,
        media_type: format.mime(),
        filename,
    })
}

/// Write `artifact` into `dir` and return the final path.
///
/// Writes to a temporary sibling first and renames it into place, so a
/// crash never leaves a half-written export behind.
pub async fn write_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf, SkrivError> {
    let path = dir.join(&artifact.filename);
    let write_err = |source: std::io::Error| SkrivError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = dir.join(format!(".{}.tmp", artifact.filename));
    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Drop characters XML 1.0 cannot carry. Tab and newline are handled by the
/// callers before this point.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
        })
        .collect()
}

// ── DOCX ──────────────────────────────────────────────────────────────────

const LABEL_COLOR: &str = "1F4E79";
const HIGHLIGHT: &str = "yellow";

/// One run per body line, separated by line breaks; tabs become tab elements.
fn body_run(text: &str) -> docx_rs::Run {
    let mut run = docx_rs::Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(docx_rs::BreakType::TextWrapping);
        }
        let line = line.trim_end_matches('\r');
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                run = run.add_tab();
            }
            if !segment.is_empty() {
                run = run.add_text(xml_safe(segment));
            }
        }
    }
    run
}

fn encode_docx(body: &str, suggestions: &[Suggestion]) -> Result<Vec<u8>, SkrivError> {
    let mut docx = docx_rs::Docx::new().add_paragraph(docx_rs::Paragraph::new().add_run(body_run(body)));

    for (i, suggestion) in suggestions.iter().enumerate() {
        let label = docx_rs::Run::new()
            .add_text(format!("Comment {}: ", i + 1))
            .bold()
            .color(LABEL_COLOR);
        let comment = docx_rs::Run::new()
            .add_text(xml_safe(&suggestion.body.replace(['\n', '\t'], " ")))
            .italic()
            .highlight(HIGHLIGHT);
        docx = docx.add_paragraph(docx_rs::Paragraph::new().add_run(label).add_run(comment));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| SkrivError::EncodingFailure {
            format: MediaType::Docx.label(),
            detail: e.to_string(),
        })?;
    Ok(cursor.into_inner())
}

// ── PDF ───────────────────────────────────────────────────────────────────

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
/// Fill colour of comment lines (RGB, 0..1).
const COMMENT_RGB: [f32; 3] = [0.12, 0.31, 0.47];

fn pdf_err(e: impl std::fmt::Display) -> SkrivError {
    SkrivError::EncodingFailure {
        format: MediaType::Pdf.label(),
        detail: e.to_string(),
    }
}

fn encode_pdf(
    body: &str,
    suggestions: &[Suggestion],
    layout: &PdfLayout,
) -> Result<Vec<u8>, SkrivError> {
    let bodies: Vec<String> = suggestions.iter().map(|s| s.body.clone()).collect();
    let pages = paginate(body, &bodies, layout);
    debug!("PDF layout produced {} page(s)", pages.len());

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let mut operations = Vec::new();
        for line in &page.lines {
            if line.text.is_empty() {
                continue;
            }
            let (font, size) = match line.role {
                LineRole::Heading => (FONT_BOLD, layout.heading_size),
                LineRole::Body | LineRole::Comment(_) => (FONT_REGULAR, layout.font_size),
            };
            let x = layout.margin;
            let y = layout.page_height - layout.margin - line.offset - size;

            operations.push(Operation::new("BT", vec![]));
            if let LineRole::Comment(_) = line.role {
                let [r, g, b] = COMMENT_RGB;
                operations.push(Operation::new(
                    "rg",
                    vec![Object::Real(r), Object::Real(g), Object::Real(b)],
                ));
            }
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
            ));
            operations.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_winansi(&line.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let stream = lopdf::Stream::new(dictionary! {}, content.encode().map_err(pdf_err)?);
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(layout.page_width),
                Object::Real(layout.page_height),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_err)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Language;
    use crate::pipeline::decode::decode_as;

    fn doc(text: &str) -> Document {
        Document::new(text, Language::Swedish)
    }

    #[test]
    fn text_export_is_body_only() {
        let a = encode(
            &doc("Hello world"),
            &[Suggestion::new("ignored")],
            MediaType::PlainText,
            DEFAULT_BASE_NAME,
            &PdfLayout::default(),
        )
        .unwrap();
        assert_eq!(a.bytes, b"Hello world");
        assert_eq!(a.filename, "skrivsmart_dokument.txt");
        assert_eq!(a.media_type, "text/plain");
    }

    #[test]
    fn docx_export_contains_labelled_comments() {
        let a = encode(
            &doc("Rad ett\nRad två"),
            &[Suggestion::new("Byt ord"), Suggestion::new("Lägg till slut")],
            MediaType::Docx,
            "utkast",
            &PdfLayout::default(),
        )
        .unwrap();
        assert_eq!(a.filename, "utkast.docx");
        let text = decode_as(&a.bytes, MediaType::Docx).unwrap();
        assert_eq!(
            text,
            "Rad ett\nRad två\n\nComment 1: Byt ord\n\nComment 2: Lägg till slut"
        );
    }

    #[test]
    fn docx_strips_control_characters() {
        let a = encode(
            &doc("bell\u{7}here"),
            &[],
            MediaType::Docx,
            DEFAULT_BASE_NAME,
            &PdfLayout::default(),
        )
        .unwrap();
        assert_eq!(decode_as(&a.bytes, MediaType::Docx).unwrap(), "bellhere");
    }

    #[test]
    fn pdf_export_round_trips_words() {
        let a = encode(
            &doc("Åsa skriver en berättelse"),
            &[],
            MediaType::Pdf,
            DEFAULT_BASE_NAME,
            &PdfLayout::default(),
        )
        .unwrap();
        assert!(a.bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(
            decode_as(&a.bytes, MediaType::Pdf).unwrap(),
            "Åsa skriver en berättelse"
        );
    }

    #[test]
    fn pdf_comments_follow_heading() {
        let a = encode(
            &doc("Text"),
            &[Suggestion::new("Första"), Suggestion::new("Andra")],
            MediaType::Pdf,
            DEFAULT_BASE_NAME,
            &PdfLayout::default(),
        )
        .unwrap();
        assert_eq!(
            decode_as(&a.bytes, MediaType::Pdf).unwrap(),
            "Text Comments Första Andra"
        );
    }

    #[tokio::test]
    async fn write_artifact_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            bytes: b"hej".to_vec(),
            media_type: "text/plain",
            filename: "x.txt".into(),
        };
        let path = write_artifact(&artifact, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hej");
        assert!(!dir.path().join(".x.txt.tmp").exists());
    }
}
