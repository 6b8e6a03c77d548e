//! # skrivsmart
//!
//! The document pipeline behind a writing assistant: read an uploaded draft,
//! run AI-backed transforms on it one at a time, and export the result with
//! its suggestions as plain text, DOCX or a paginated PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (.txt / .docx / .pdf, path or URL)
//!  │
//!  ├─ 1. Input    resolve path or download, type by extension / Content-Type
//!  ├─ 2. Decode   bytes → canonical text (docx-rs, lopdf)
//!  ├─ 3. Session  single-flight transforms against one document
//!  │              suggestions · brainstorm · fact-check · generate-intro
//!  │              continue-writing · rewrite · make-longer · make-shorter
//!  └─ 4. Encode   text + suggestions → .txt / .docx / .pdf (manual layout)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skrivsmart::{ExportFormat, Language, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = SessionConfig::builder().language(Language::Swedish).build()?;
//!     let session = Session::from_config(config)?;
//!
//!     session.set_text("Det var en gång en drake som älskade glass.");
//!     session.suggest().await?;
//!     for s in session.suggestions() {
//!         println!("- {}", s.body);
//!     }
//!
//!     let pdf = session.export(ExportFormat::Pdf).await?;
//!     std::fs::write(&pdf.filename, &pdf.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Bring your own prompt service
//!
//! The session only depends on the [`PromptService`] trait. Implement it to
//! route transforms through something other than `edgequake-llm` (a remote
//! HTTP bridge, a cache, a scripted double in tests) and pass it to
//! [`Session::new`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `skrivsmart` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod document;
pub mod error;
pub mod observer;
pub mod operation;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{AnalysisCache, AnalysisResult, SCORE_RANGE};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use document::{Document, Language, Suggestion};
pub use error::{OperationError, SkrivError};
pub use observer::{NoopObserver, ObserverHandle, SessionObserver};
pub use operation::{OperationKind, OperationRequest, OperationResult, OperationState};
pub use pipeline::decode::{decode, MediaType};
pub use pipeline::encode::{encode, write_artifact, ExportArtifact, ExportFormat};
pub use pipeline::input::{resolve_upload, Upload};
pub use pipeline::layout::PdfLayout;
pub use pipeline::llm::LlmPromptService;
pub use service::{PromptService, ServiceError};
pub use session::{Session, SessionSnapshot, TransientResults};
