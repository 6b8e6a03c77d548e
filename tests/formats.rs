//! Decode and export integration tests. No prompt service involved.

use skrivsmart::pipeline::decode::{MIME_DOCX, MIME_PDF, MIME_TEXT};
use skrivsmart::pipeline::layout::{paginate, PdfLayout};
use skrivsmart::{
    decode, encode, resolve_upload, write_artifact, Document, ExportFormat, Language, SkrivError,
    Suggestion,
};

fn document(text: &str) -> Document {
    Document::new(text, Language::Swedish)
}

fn export(text: &str, suggestions: &[Suggestion], format: ExportFormat) -> Vec<u8> {
    encode(
        &document(text),
        suggestions,
        format,
        "skrivsmart_dokument",
        &PdfLayout::default(),
    )
    .unwrap()
    .bytes
}

/// Page count of a PDF, read back with lopdf.
fn pdf_page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
}

// ── Plain text ───────────────────────────────────────────────────────────────

#[test]
fn txt_round_trip() {
    let bytes = export("Hello world", &[], ExportFormat::PlainText);
    assert_eq!(decode(&bytes, MIME_TEXT).unwrap(), "Hello world");
}

#[test]
fn txt_with_charset_parameter() {
    assert_eq!(
        decode("Åsa".as_bytes(), "text/plain; charset=utf-8").unwrap(),
        "Åsa"
    );
}

// ── DOCX ─────────────────────────────────────────────────────────────────────

#[test]
fn docx_round_trip_body_only() {
    let text = "Första raden\nAndra raden\tmed tabb";
    let bytes = export(text, &[], ExportFormat::Docx);
    assert_eq!(decode(&bytes, MIME_DOCX).unwrap(), text);
}

#[test]
fn docx_round_trip_with_suggestions() {
    let suggestions = vec![
        Suggestion::new("Jag noterar att inledningen är kort."),
        Suggestion::new("Jag noterar att slutet kom plötsligt."),
    ];
    let bytes = export("Berättelsen.", &suggestions, ExportFormat::Docx);
    let decoded = decode(&bytes, MIME_DOCX).unwrap();
    let paragraphs: Vec<&str> = decoded.split("\n\n").collect();
    assert_eq!(
        paragraphs,
        [
            "Berättelsen.",
            "Comment 1: Jag noterar att inledningen är kort.",
            "Comment 2: Jag noterar att slutet kom plötsligt.",
        ]
    );
}

// ── PDF ──────────────────────────────────────────────────────────────────────

#[test]
fn pdf_round_trip_single_page() {
    let bytes = export("Hello world", &[], ExportFormat::Pdf);
    assert_eq!(pdf_page_count(&bytes), 1);
    assert_eq!(decode(&bytes, MIME_PDF).unwrap(), "Hello world");
}

#[test]
fn pdf_transliterates_outside_winansi() {
    let bytes = export("Čačak i Đakovo", &[], ExportFormat::Pdf);
    assert_eq!(decode(&bytes, MIME_PDF).unwrap(), "Cacak i Ðakovo");
}

#[test]
fn pdf_paginates_many_suggestions_without_splitting() {
    let layout = PdfLayout::default();
    let body = "Det var en gång en liten drake som bodde i en grotta vid havet. ".repeat(20);
    let suggestions: Vec<Suggestion> = (1..=60)
        .map(|i| {
            Suggestion::new(format!(
                "Jag noterar ({i}) att stycket kan utvecklas med fler detaljer om \
                 miljön, karaktärernas känslor och vad som händer sedan."
            ))
        })
        .collect();

    let bytes = export(&body, &suggestions, ExportFormat::Pdf);
    let pages = pdf_page_count(&bytes);
    assert!(pages >= 2, "expected ≥ 2 pages, got {pages}");

    let bodies: Vec<String> = suggestions.iter().map(|s| s.body.clone()).collect();
    let laid_out = paginate(&body, &bodies, &layout);
    assert_eq!(laid_out.len(), pages);

    let mut seen = std::collections::HashSet::new();
    for page in &laid_out {
        for idx in page.comment_indices() {
            assert!(seen.insert(idx), "suggestion {idx} split across pages");
        }
    }
    assert_eq!(seen.len(), suggestions.len());

    // Every suggestion's words are present, in order, after decoding.
    let decoded = decode(&bytes, MIME_PDF).unwrap();
    let mut cursor = 0;
    for s in &suggestions {
        let pos = decoded[cursor..]
            .find(&s.body.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
            .unwrap_or_else(|| panic!("missing suggestion: {}", s.body));
        cursor += pos;
    }
}

// ── Rejections ───────────────────────────────────────────────────────────────

#[test]
fn unsupported_media_type() {
    let err = decode(b"GIF89a", "image/gif").unwrap_err();
    assert!(matches!(err, SkrivError::UnsupportedFormat { .. }));
}

#[test]
fn corrupt_inputs() {
    assert!(matches!(
        decode(b"PK\x03\x04garbage", MIME_DOCX),
        Err(SkrivError::CorruptDocument { .. })
    ));
    assert!(matches!(
        decode(b"%PDF-1.7\n%%EOF", MIME_PDF),
        Err(SkrivError::CorruptDocument { .. })
    ));
}

// ── Files ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_written_to_disk_decodes_back() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = encode(
        &document("Sparad text"),
        &[Suggestion::new("Bra!")],
        ExportFormat::Docx,
        "utkast",
        &PdfLayout::default(),
    )
    .unwrap();

    let path = write_artifact(&artifact, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "utkast.docx");

    let upload = resolve_upload(path.to_str().unwrap(), 5).await.unwrap();
    let text = skrivsmart::pipeline::decode::decode_as(&upload.bytes, upload.media_type).unwrap();
    assert_eq!(text, "Sparad text\n\nComment 1: Bra!");
}

#[test]
fn unknown_upload_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bild.png");
    std::fs::write(&path, b"\x89PNG").unwrap();

    let err = tokio_test::block_on(resolve_upload(path.to_str().unwrap(), 5)).unwrap_err();
    assert!(matches!(err, SkrivError::UnsupportedFormat { .. }));
}
