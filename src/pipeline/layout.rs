//! Manual page layout for the PDF export.
//!
//! PDF has no text flow of its own: every line must be measured, wrapped and
//! positioned by hand. This module does that as a pure computation over
//! strings and font metrics so pagination can be tested without producing a
//! single PDF byte; [`crate::pipeline::encode`] only turns the resulting
//! [`Page`]s into content streams.
//!
//! ## Pagination rules
//!
//! 1. Body lines flow from the top margin; body overflow continues on a new
//!    page line by line.
//! 2. With suggestions present, the "Comments" heading goes on a fresh page
//!    when the cursor is already within `comments_threshold` of the bottom,
//!    otherwise it follows the body after `section_gap`.
//! 3. Each suggestion is wrapped on its own. If its block does not fit in the
//!    remaining height, a new page is started *before* it, so a suggestion is
//!    never split across pages. A suggestion taller than a whole page is the
//!    only exception: it starts on a fresh page and spills line by line.

use crate::pipeline::font::text_width;
use serde::{Deserialize, Serialize};

/// Page geometry and typography of the PDF export. All values in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfLayout {
    /// Default: 595.28 (A4).
    pub page_width: f32,
    /// Default: 841.89 (A4).
    pub page_height: f32,
    /// Margin applied on all four sides. Default: 50.
    pub margin: f32,
    /// Body and comment font size. Default: 12.
    pub font_size: f32,
    /// Distance between consecutive baselines. Default: 16.
    pub line_height: f32,
    /// Font size of the "Comments" heading. Default: 14.
    pub heading_size: f32,
    /// Near-bottom zone that pushes the heading to a new page. Default: 72.
    pub comments_threshold: f32,
    /// Gap between the body and the heading. Default: 24.
    pub section_gap: f32,
    /// Gap between consecutive suggestions. Default: 8.
    pub paragraph_gap: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 50.0,
            font_size: 12.0,
            line_height: 16.0,
            heading_size: 14.0,
            comments_threshold: 72.0,
            section_gap: 24.0,
            paragraph_gap: 8.0,
        }
    }
}

impl PdfLayout {
    pub fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }

    /// Line height used for the heading, scaled from the body ratio.
    pub fn heading_line_height(&self) -> f32 {
        self.line_height * self.heading_size / self.font_size
    }

    /// Reject geometry that leaves no room to write.
    pub fn validate(&self) -> Result<(), String> {
        if self.margin < 0.0 {
            return Err(format!("PDF margin must be ≥ 0, got {}", self.margin));
        }
        if self.usable_width() < self.font_size * 2.0 {
            return Err("PDF usable width is too small for the font size".into());
        }
        if self.usable_height() < self.heading_line_height() + self.line_height {
            return Err("PDF usable height is too small for the line height".into());
        }
        if self.font_size <= 0.0 || self.line_height <= 0.0 || self.heading_size <= 0.0 {
            return Err("PDF font sizes and line height must be positive".into());
        }
        Ok(())
    }
}

/// What a placed line belongs to; decides font and colour when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Body,
    Heading,
    /// A line of the suggestion with the given 0-based index.
    Comment(usize),
}

/// One line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Distance from the top margin to the top of the line box.
    pub offset: f32,
    pub role: LineRole,
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

impl Page {
    /// Indices of suggestions with at least one line on this page.
    pub fn comment_indices(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .lines
            .iter()
            .filter_map(|l| match l.role {
                LineRole::Comment(i) => Some(i),
                _ => None,
            })
            .collect();
        out.dedup();
        out
    }
}

/// Greedy word wrap of `text` to `max_width` points at `font_size`.
///
/// Explicit newlines are kept (an empty input line yields an empty output
/// line); runs of spaces collapse to one; a word wider than the line is
/// broken between characters.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                for chunk in break_word(word, max_width, font_size) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current = chunk;
                }
            }
        }

        lines.push(current);
    }

    lines
}

/// Split a single over-long word into chunks that each fit `max_width`.
fn break_word(word: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if text_width(&current, font_size) > max_width && current.chars().count() > 1 {
            current.pop();
            chunks.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Heading written above the suggestions.
pub const COMMENTS_HEADING: &str = "Comments";

/// Lay out `body` followed by the `suggestions` block into pages.
///
/// Always returns at least one page.
pub fn paginate(body: &str, suggestions: &[String], layout: &PdfLayout) -> Vec<Page> {
    let width = layout.usable_width();
    let height = layout.usable_height();
    let mut pages = vec![Page::default()];
    let mut cursor = 0.0_f32;

    // ── Body: flows line by line ──────────────────────────────────────────
    if !body.is_empty() {
        for line in wrap_text(body, width, layout.font_size) {
            if cursor + layout.line_height > height {
                pages.push(Page::default());
                cursor = 0.0;
            }
            push_line(&mut pages, line, cursor, LineRole::Body);
            cursor += layout.line_height;
        }
    }

    if suggestions.is_empty() {
        return pages;
    }

    // ── Heading ───────────────────────────────────────────────────────────
    if cursor > 0.0 {
        if cursor >= height - layout.comments_threshold {
            pages.push(Page::default());
            cursor = 0.0;
        } else {
            cursor += layout.section_gap;
        }
    }
    push_line(
        &mut pages,
        COMMENTS_HEADING.to_string(),
        cursor,
        LineRole::Heading,
    );
    cursor += layout.heading_line_height();

    // ── Suggestions: paginated per block ──────────────────────────────────
    for (index, suggestion) in suggestions.iter().enumerate() {
        let lines = wrap_text(suggestion, width, layout.font_size);
        let block = lines.len() as f32 * layout.line_height;

        if cursor + block > height && cursor > 0.0 {
            pages.push(Page::default());
            cursor = 0.0;
        }

        for line in lines {
            // Only reachable for a block taller than a whole page.
            if cursor + layout.line_height > height {
                pages.push(Page::default());
                cursor = 0.0;
            }
            push_line(&mut pages, line, cursor, LineRole::Comment(index));
            cursor += layout.line_height;
        }
        cursor += layout.paragraph_gap;
    }

    pages
}

fn push_line(pages: &mut [Page], text: String, offset: f32, role: LineRole) {
    if let Some(page) = pages.last_mut() {
        page.lines.push(PlacedLine { text, offset, role });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PdfLayout {
        PdfLayout::default()
    }

    #[test]
    fn usable_area() {
        let l = layout();
        assert!((l.usable_width() - 495.28).abs() < 0.01);
        assert!((l.usable_height() - 741.89).abs() < 0.01);
        assert!(l.validate().is_ok());
    }

    #[test]
    fn invalid_geometry_rejected() {
        let l = PdfLayout {
            margin: 290.0,
            ..PdfLayout::default()
        };
        assert!(l.validate().is_err());
    }

    #[test]
    fn wrap_respects_width() {
        let text = "Det var en gång en drake som älskade glass mer än något annat i hela världen. ".repeat(10);
        let lines = wrap_text(&text, 200.0, 12.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 12.0) <= 200.0, "too wide: {line:?}");
        }
        let rejoined = lines.join(" ");
        assert_eq!(
            rejoined.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn wrap_keeps_explicit_newlines() {
        let lines = wrap_text("one\n\nthree", 400.0, 12.0);
        assert_eq!(lines, vec!["one", "", "three"]);
    }

    #[test]
    fn wrap_breaks_long_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 100.0, 12.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, 12.0) <= 100.0);
        }
    }

    #[test]
    fn short_document_fits_one_page() {
        let pages = paginate("Hello world", &[], &layout());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.len(), 1);
        assert_eq!(pages[0].lines[0].offset, 0.0);
    }

    #[test]
    fn heading_follows_body_with_gap() {
        let l = layout();
        let pages = paginate("Hello", &["Jag noterar att…".to_string()], &l);
        assert_eq!(pages.len(), 1);
        let heading = &pages[0].lines[1];
        assert_eq!(heading.role, LineRole::Heading);
        assert!((heading.offset - (l.line_height + l.section_gap)).abs() < 0.001);
    }

    #[test]
    fn heading_moves_to_new_page_near_bottom() {
        let l = layout();
        // Enough body lines to land inside the threshold zone.
        let lines_needed = ((l.usable_height() - l.comments_threshold) / l.line_height).ceil() as usize + 1;
        let body = vec!["line"; lines_needed].join("\n");
        let pages = paginate(&body, &["note".to_string()], &l);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines[0].role, LineRole::Heading);
        assert_eq!(pages[1].lines[0].offset, 0.0);
    }

    #[test]
    fn long_body_flows_onto_more_pages() {
        let body = vec!["line"; 100].join("\n");
        let pages = paginate(&body, &[], &layout());
        assert!(pages.len() >= 2);
        let total: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn suggestions_overflow_without_splitting() {
        let l = layout();
        let suggestion = "Jag noterar att texten har en tydlig början men att mitten skulle kunna \
                          utvecklas med fler detaljer om karaktärerna och miljön. "
            .repeat(3);
        let suggestions = vec![suggestion; 40];
        let pages = paginate("Kort text.", &suggestions, &l);
        assert!(pages.len() >= 2, "expected overflow, got {} page(s)", pages.len());

        // No suggestion index may appear on two pages.
        let mut seen = std::collections::HashSet::new();
        for page in &pages {
            for idx in page.comment_indices() {
                assert!(seen.insert(idx), "suggestion {idx} split across pages");
            }
            for line in &page.lines {
                assert!(line.offset + l.line_height <= l.usable_height() + 0.001);
            }
        }
        assert_eq!(seen.len(), 40);
    }
}
