//! The prompt-service seam.
//!
//! The session never talks to a language model directly: it hands a typed
//! [`OperationRequest`] to a [`PromptService`] and gets back the raw JSON
//! object the service produced. Shape validation happens afterwards in
//! [`crate::OperationResult::from_response`], so every implementation
//! (the LLM-backed one, a scripted test double, a remote HTTP bridge) is held
//! to the same contract.

use crate::operation::OperationRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Why a prompt-service call produced no usable JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The call itself failed: network, authentication, provider error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with something that is not a JSON object.
    #[error("response is not valid JSON: {0}")]
    MalformedPayload(String),

    /// No answer within the configured time budget.
    #[error("no response within {secs}s")]
    Timeout { secs: u64 },
}

/// An external collaborator that executes one transform per call.
///
/// Implementations must be shareable across tasks; the session holds one
/// behind an `Arc` and never calls it concurrently with itself.
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Execute `request` and return the response object unvalidated.
    async fn invoke(&self, request: &OperationRequest) -> Result<serde_json::Value, ServiceError>;
}
