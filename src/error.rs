//! Error types for the skrivsmart library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SkrivError`]: returned directly to the caller from decode, export,
//!   upload and configuration entry points. Nothing is retried; the caller
//!   sees the failure immediately.
//!
//! * [`OperationError`]: a transform failed (busy lock held, precondition
//!   unmet, prompt service down, malformed response). Besides being returned
//!   from [`crate::Session::submit`], it is stored inside
//!   [`crate::OperationState::Failed`] so the session keeps a record of the
//!   last failure and the caller can render it later.
//!
//! Neither kind is fatal: the session stays usable after any error.

use crate::operation::OperationKind;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by decode, export and session plumbing.
#[derive(Debug, Error)]
pub enum SkrivError {
    // ── Upload / decode errors ────────────────────────────────────────────
    /// The declared media type (or file extension) is not one of
    /// text/plain, DOCX or PDF.
    #[error("Unsupported format '{media_type}'\nSupported uploads: .txt, .docx, .pdf")]
    UnsupportedFormat { media_type: String },

    /// The bytes claim a supported format but could not be decoded.
    #[error("Could not read {format} document: {detail}")]
    CorruptDocument { format: &'static str, detail: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Serialising an export package failed.
    #[error("Failed to encode {format} export: {detail}")]
    EncodingFailure { format: &'static str, detail: String },

    /// Could not create or write an exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Orchestration ─────────────────────────────────────────────────────
    /// A transform failed; see [`OperationError`].
    #[error(transparent)]
    Operation(#[from] OperationError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed transform.
///
/// Cloneable and serialisable so it can live inside
/// [`crate::OperationState::Failed`] and be shipped to a UI as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum OperationError {
    /// Another transform is still in flight. The rejected request was not
    /// dispatched and nothing was changed.
    #[error("Busy: '{in_flight}' is still running, wait for it to finish")]
    Busy { in_flight: OperationKind },

    /// The request was rejected before any network call.
    #[error("{kind}: {reason}")]
    PreconditionFailed { kind: OperationKind, reason: String },

    /// The prompt service answered, but not with the expected result field.
    #[error("{kind}: malformed response from prompt service: {detail}")]
    InvalidResponse { kind: OperationKind, detail: String },

    /// The prompt service call itself failed (transport, provider, timeout).
    #[error("{kind}: prompt service failed: {message}")]
    ServiceError { kind: OperationKind, message: String },
}

impl OperationError {
    /// The transform this error belongs to. For [`OperationError::Busy`] this
    /// is the transform that holds the lock.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationError::Busy { in_flight } => *in_flight,
            OperationError::PreconditionFailed { kind, .. }
            | OperationError::InvalidResponse { kind, .. }
            | OperationError::ServiceError { kind, .. } => *kind,
        }
    }
}
