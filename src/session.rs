//! The single-flight transform orchestrator.
//!
//! A [`Session`] owns one [`Document`], the current suggestion list, the
//! [`AnalysisCache`] and the per-tool result panels. All of it sits behind a
//! single mutex that is only held for short, synchronous sections and never
//! across an `.await`; the prompt-service call runs with the lock released
//! and the [`OperationState::Busy`] flag acting as the busy lock.
//!
//! ```text
//! submit(request)
//!   ├─ Busy?          → Err(Busy), nothing touched
//!   ├─ preconditions  → Failed(kind, PreconditionFailed), no call
//!   ├─ Busy(kind), clear result panels
//!   ├─ service.invoke(request)            (lock released)
//!   ├─ validate response shape
//!   └─ Succeeded(kind, result) + apply    | Failed(kind, error)
//! ```

use crate::analysis::{AnalysisCache, AnalysisResult};
use crate::config::SessionConfig;
use crate::document::{Document, Language, Suggestion};
use crate::error::{OperationError, SkrivError};
use crate::operation::{OperationKind, OperationRequest, OperationResult, OperationState};
use crate::pipeline::decode::decode_as;
use crate::pipeline::encode::{encode, ExportArtifact, ExportFormat};
use crate::pipeline::input::Upload;
use crate::pipeline::llm::LlmPromptService;
use crate::service::{PromptService, ServiceError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Output panels of the one-shot tools. At most one is populated at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientResults {
    pub brainstorm: Option<Vec<String>>,
    pub fact_check: Option<String>,
    pub generated_intro: Option<String>,
}

impl TransientResults {
    pub fn is_empty(&self) -> bool {
        self.brainstorm.is_none() && self.fact_check.is_none() && self.generated_intro.is_none()
    }
}

/// Serialisable view of everything a session holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub document: Document,
    pub suggestions: Vec<Suggestion>,
    pub analysis: Option<AnalysisResult>,
    pub transient: TransientResults,
    pub state: OperationState,
}

#[derive(Debug, Default)]
struct Inner {
    document: Document,
    suggestions: Vec<Suggestion>,
    analysis: AnalysisCache,
    transient: TransientResults,
    state: OperationState,
}

impl Inner {
    /// Fold a validated result into the session.
    fn apply(&mut self, request: &OperationRequest, result: &OperationResult) {
        match result {
            OperationResult::Suggestions { suggestions } => {
                self.suggestions = suggestions.iter().cloned().map(Suggestion::from).collect();
                let language = request.language().unwrap_or(self.document.language);
                let score = self.analysis.record(language).score;
                debug!(
                    "Applied {} suggestion(s), score {}",
                    self.suggestions.len(),
                    score
                );
            }
            OperationResult::Brainstorm { suggestions } => {
                self.transient.brainstorm = Some(suggestions.clone());
            }
            OperationResult::FactCheck {
                verification_result,
            } => {
                self.transient.fact_check = Some(verification_result.clone());
            }
            OperationResult::GenerateIntro { generated_text } => {
                self.document.text = format!("{}\n\n{}", generated_text, self.document.text);
                self.transient.generated_intro = Some(generated_text.clone());
            }
            OperationResult::ContinueWriting { continuation } => {
                self.document.text = format!("{}\n\n{}", self.document.text, continuation);
            }
            OperationResult::Rewrite { rewritten_text: text }
            | OperationResult::MakeLonger { longer_text: text }
            | OperationResult::MakeShorter { shorter_text: text } => {
                self.document.text = text.clone();
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), OperationError> {
        match self.state {
            OperationState::Busy { kind } => Err(OperationError::Busy { in_flight: kind }),
            _ => Ok(()),
        }
    }
}

/// Which result panels a dispatch clears when it takes the busy lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clearing {
    /// Regular submission: every other tool's panel is cleared.
    Others,
    /// Suggestions re-run after a language change: nothing is cleared.
    Nothing,
}

/// Resets a `Busy` state left behind by a dropped `submit` future.
struct BusyGuard<'a> {
    inner: &'a Mutex<Inner>,
    kind: OperationKind,
    armed: bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == (OperationState::Busy { kind: self.kind }) {
            warn!("{}: dispatch dropped while in flight", self.kind);
            inner.state = OperationState::Failed {
                kind: self.kind,
                error: OperationError::ServiceError {
                    kind: self.kind,
                    message: "cancelled".into(),
                },
            };
        }
    }
}

/// One user's writing session over one in-memory document.
///
/// `Session` is `Send + Sync`; share it via `Arc` to drive it from several
/// tasks. Concurrent submissions are rejected with
/// [`OperationError::Busy`], never queued.
pub struct Session {
    config: SessionConfig,
    service: Arc<dyn PromptService>,
    inner: Mutex<Inner>,
}

impl Session {
    /// Create a session over an explicit prompt service.
    pub fn new(config: SessionConfig, service: Arc<dyn PromptService>) -> Self {
        let inner = Inner {
            document: Document::new(String::new(), config.language),
            ..Inner::default()
        };
        Self {
            config,
            service,
            inner: Mutex::new(inner),
        }
    }

    /// Create a session backed by the LLM provider resolved from `config`.
    pub fn from_config(config: SessionConfig) -> Result<Self, SkrivError> {
        let service = LlmPromptService::from_config(&config)?;
        Ok(Self::new(config, Arc::new(service)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn text(&self) -> String {
        self.lock().document.text.clone()
    }

    pub fn language(&self) -> Language {
        self.lock().document.language
    }

    pub fn document(&self) -> Document {
        self.lock().document.clone()
    }

    pub fn state(&self) -> OperationState {
        self.lock().state.clone()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.lock().suggestions.clone()
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.lock().analysis.get().cloned()
    }

    pub fn transient(&self) -> TransientResults {
        self.lock().transient.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            document: inner.document.clone(),
            suggestions: inner.suggestions.clone(),
            analysis: inner.analysis.get().cloned(),
            transient: inner.transient.clone(),
            state: inner.state.clone(),
        }
    }

    // ── Direct edits ──────────────────────────────────────────────────────

    /// Replace the document text, as a user typing would.
    pub fn set_text(&self, text: impl Into<String>) {
        self.lock().document.text = text.into();
    }

    /// Move a finished `Succeeded`/`Failed` state back to `Idle`.
    pub fn acknowledge(&self) {
        let mut inner = self.lock();
        if !inner.state.is_busy() {
            inner.state = OperationState::Idle;
        }
    }

    /// Clear document, suggestions, analysis and result panels. The language
    /// is kept.
    pub fn reset(&self) -> Result<(), OperationError> {
        let mut inner = self.lock();
        inner.ensure_idle()?;
        let language = inner.document.language;
        *inner = Inner {
            document: Document::new(String::new(), language),
            ..Inner::default()
        };
        info!("Session reset");
        Ok(())
    }

    /// Decode `upload` and make it the document text.
    ///
    /// Decoding runs on the blocking pool. Suggestions and analysis are kept.
    pub async fn load(&self, upload: Upload) -> Result<(), SkrivError> {
        self.lock().ensure_idle()?;

        let Upload {
            bytes,
            media_type,
            filename,
        } = upload;
        let text = tokio::task::spawn_blocking(move || decode_as(&bytes, media_type))
            .await
            .map_err(|e| SkrivError::Internal(format!("decode task failed: {e}")))??;

        let mut inner = self.lock();
        inner.ensure_idle()?;
        info!("Loaded '{}' ({} chars)", filename, text.chars().count());
        inner.document.text = text;
        Ok(())
    }

    /// Encode the current document and suggestions as `format`.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportArtifact, SkrivError> {
        let (document, suggestions) = {
            let inner = self.lock();
            (inner.document.clone(), inner.suggestions.clone())
        };
        let base_name = self.config.export_base_name.clone();
        let layout = self.config.pdf_layout.clone();
        tokio::task::spawn_blocking(move || {
            encode(&document, &suggestions, format, &base_name, &layout)
        })
        .await
        .map_err(|e| SkrivError::Internal(format!("encode task failed: {e}")))?
    }

    // ── Transforms ────────────────────────────────────────────────────────

    /// Dispatch `request` under the busy lock.
    pub async fn submit(&self, request: OperationRequest) -> Result<OperationResult, OperationError> {
        self.dispatch(request, Clearing::Others).await
    }

    async fn dispatch(
        &self,
        request: OperationRequest,
        clearing: Clearing,
    ) -> Result<OperationResult, OperationError> {
        let kind = request.kind();

        {
            let mut inner = self.lock();
            if let Err(busy) = inner.ensure_idle() {
                debug!("{} rejected: {}", kind, busy);
                return Err(busy);
            }
            if let Err(error) = request.check_preconditions() {
                inner.state = OperationState::Failed {
                    kind,
                    error: error.clone(),
                };
                drop(inner);
                warn!("{}", error);
                self.notify_failure(kind, &error);
                return Err(error);
            }
            inner.state = OperationState::Busy { kind };
            if clearing == Clearing::Others {
                inner.transient = TransientResults::default();
                if kind != OperationKind::Suggestions {
                    inner.suggestions.clear();
                }
            }
        }

        let mut guard = BusyGuard {
            inner: &self.inner,
            kind,
            armed: true,
        };

        info!("{}: dispatching", kind);
        if let Some(ref obs) = self.config.observer {
            obs.on_operation_start(kind);
        }

        let outcome = self
            .call_service(&request)
            .await
            .and_then(|response| OperationResult::from_response(kind, response));

        {
            let mut inner = self.lock();
            match &outcome {
                Ok(result) => {
                    inner.apply(&request, result);
                    inner.state = OperationState::Succeeded {
                        kind,
                        result: result.clone(),
                    };
                }
                Err(error) => {
                    inner.state = OperationState::Failed {
                        kind,
                        error: error.clone(),
                    };
                }
            }
        }
        guard.armed = false;

        match &outcome {
            Ok(_) => {
                info!("{}: done", kind);
                if let Some(ref obs) = self.config.observer {
                    obs.on_operation_success(kind);
                }
            }
            Err(error) => {
                warn!("{}", error);
                self.notify_failure(kind, error);
            }
        }
        outcome
    }

    async fn call_service(
        &self,
        request: &OperationRequest,
    ) -> Result<serde_json::Value, OperationError> {
        let kind = request.kind();
        let call = self.service.invoke(request);
        let result = match self.config.api_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
                .await
                .unwrap_or(Err(ServiceError::Timeout { secs })),
            None => call.await,
        };
        result.map_err(|e| match e {
            ServiceError::MalformedPayload(detail) => OperationError::InvalidResponse { kind, detail },
            other => OperationError::ServiceError {
                kind,
                message: other.to_string(),
            },
        })
    }

    fn notify_failure(&self, kind: OperationKind, error: &OperationError) {
        if let Some(ref obs) = self.config.observer {
            obs.on_operation_failure(kind, &error.to_string());
        }
    }

    /// Change the document language.
    ///
    /// When an analysis exists and the language actually changes, the
    /// suggestions are re-run for the new language; the score is kept and
    /// no other result panel is cleared. Returns the re-run's result, if one
    /// was dispatched.
    pub async fn change_language(
        &self,
        language: Language,
    ) -> Result<Option<OperationResult>, OperationError> {
        let rerun = {
            let mut inner = self.lock();
            inner.ensure_idle()?;
            let changed = inner.document.language != language;
            inner.document.language = language;
            changed && !inner.analysis.is_empty()
        };
        if !rerun {
            return Ok(None);
        }
        let request = OperationRequest::Suggestions {
            text: self.text(),
            language,
        };
        self.dispatch(request, Clearing::Nothing).await.map(Some)
    }

    // ── Convenience builders ──────────────────────────────────────────────

    /// Suggestions for the current text in the document language.
    pub async fn suggest(&self) -> Result<OperationResult, OperationError> {
        let Document { text, language } = self.document();
        self.submit(OperationRequest::Suggestions { text, language }).await
    }

    pub async fn brainstorm(&self) -> Result<OperationResult, OperationError> {
        let Document { text, language } = self.document();
        self.submit(OperationRequest::Brainstorm {
            input_text: text,
            language,
        })
        .await
    }

    pub async fn fact_check(
        &self,
        source_url: impl Into<String>,
    ) -> Result<OperationResult, OperationError> {
        self.submit(OperationRequest::FactCheck {
            text: self.text(),
            source_url: source_url.into(),
        })
        .await
    }

    pub async fn generate_intro(
        &self,
        idea: impl Into<String>,
    ) -> Result<OperationResult, OperationError> {
        self.submit(OperationRequest::GenerateIntro {
            prompt: idea.into(),
            language: self.language(),
        })
        .await
    }

    pub async fn continue_writing(&self) -> Result<OperationResult, OperationError> {
        let Document { text, language } = self.document();
        self.submit(OperationRequest::ContinueWriting { text, language })
            .await
    }

    pub async fn rewrite(&self) -> Result<OperationResult, OperationError> {
        self.submit(OperationRequest::Rewrite { text: self.text() })
            .await
    }

    pub async fn make_longer(&self) -> Result<OperationResult, OperationError> {
        let Document { text, language } = self.document();
        self.submit(OperationRequest::MakeLonger { text, language })
            .await
    }

    pub async fn make_shorter(&self) -> Result<OperationResult, OperationError> {
        let Document { text, language } = self.document();
        self.submit(OperationRequest::MakeShorter { text, language })
            .await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl PromptService for Echo {
        async fn invoke(
            &self,
            request: &OperationRequest,
        ) -> Result<serde_json::Value, ServiceError> {
            let field = request.kind().result_field();
            Ok(match request.kind() {
                OperationKind::Suggestions | OperationKind::Brainstorm => {
                    json!({ field: ["one", "two"] })
                }
                _ => json!({ field: "echo" }),
            })
        }
    }

    fn session() -> Session {
        Session::new(SessionConfig::default(), Arc::new(Echo))
    }

    #[test]
    fn apply_intro_prepends_with_blank_line() {
        let mut inner = Inner::default();
        inner.document.text = "body".into();
        let req = OperationRequest::GenerateIntro {
            prompt: "idea".into(),
            language: Language::Swedish,
        };
        inner.apply(
            &req,
            &OperationResult::GenerateIntro {
                generated_text: "intro".into(),
            },
        );
        assert_eq!(inner.document.text, "intro\n\nbody");
        assert_eq!(inner.transient.generated_intro.as_deref(), Some("intro"));
    }

    #[test]
    fn apply_continuation_appends_with_blank_line() {
        let mut inner = Inner::default();
        inner.document.text = "body".into();
        let req = OperationRequest::ContinueWriting {
            text: "body".into(),
            language: Language::Swedish,
        };
        inner.apply(
            &req,
            &OperationResult::ContinueWriting {
                continuation: "more".into(),
            },
        );
        assert_eq!(inner.document.text, "body\n\nmore");
    }

    #[test]
    fn busy_guard_releases_lock_when_dropped() {
        let s = session();
        s.lock().state = OperationState::Busy {
            kind: OperationKind::Rewrite,
        };
        drop(BusyGuard {
            inner: &s.inner,
            kind: OperationKind::Rewrite,
            armed: true,
        });
        assert!(matches!(
            s.state(),
            OperationState::Failed {
                kind: OperationKind::Rewrite,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn acknowledge_returns_to_idle() {
        let s = session();
        s.set_text("text");
        s.rewrite().await.unwrap();
        assert!(matches!(s.state(), OperationState::Succeeded { .. }));
        s.acknowledge();
        assert_eq!(s.state(), OperationState::Idle);
    }

    #[tokio::test]
    async fn reset_keeps_language() {
        let s = session();
        s.set_text("text");
        s.change_language(Language::Serbian).await.unwrap();
        s.suggest().await.unwrap();
        s.reset().unwrap();
        assert_eq!(s.language(), Language::Serbian);
        assert!(s.text().is_empty());
        assert!(s.analysis().is_none());
        assert!(s.suggestions().is_empty());
    }

    #[test]
    fn session_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }
}
