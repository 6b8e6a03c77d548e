//! Pipeline stages around the session.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ (Session) ──▶ layout ──▶ encode
//! (path/URL) (text)     (llm)        (pages)    (bytes)
//! ```
//!
//! 1. [`input`]  resolve a path or URL into an in-memory upload
//! 2. [`decode`] plain text, DOCX (docx-rs) and PDF (lopdf) to canonical text
//! 3. [`llm`]    the `edgequake-llm` backed prompt service; the only stage
//!    with model I/O
//! 4. [`layout`] wrap and paginate text for the PDF export, using the
//!    Helvetica metrics in [`font`]
//! 5. [`encode`] text, DOCX and PDF writers

pub mod decode;
pub mod encode;
pub mod font;
pub mod input;
pub mod layout;
pub mod llm;
