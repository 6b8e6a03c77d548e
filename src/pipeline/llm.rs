//! Language-model backed [`PromptService`].
//!
//! Each request becomes a two-message chat: the per-kind system prompt from
//! [`crate::prompts`] and a user message carrying the request payload as
//! JSON. The model is asked to answer with a bare JSON object; models that
//! wrap it in markdown fences anyway are tolerated.

use crate::config::SessionConfig;
use crate::error::SkrivError;
use crate::operation::OperationRequest;
use crate::prompts::{system_prompt, user_message};
use crate::service::{PromptService, ServiceError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Prompt service that calls an `edgequake-llm` provider.
pub struct LlmPromptService {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmPromptService {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &SessionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve a provider from `config` and wrap it.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SkrivError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl PromptService for LlmPromptService {
    async fn invoke(&self, request: &OperationRequest) -> Result<serde_json::Value, ServiceError> {
        let kind = request.kind();
        let messages = vec![
            ChatMessage::system(system_prompt(request)),
            ChatMessage::user(user_message(request)),
        ];

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| {
                warn!("{}: provider call failed: {}", kind, e);
                ServiceError::Transport(e.to_string())
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            kind,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        parse_json_object(&response.content)
    }
}

/// Build `CompletionOptions` from the session config.
fn build_options(config: &SessionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    }
}

/// Parse model output into a JSON object.
fn parse_json_object(content: &str) -> Result<serde_json::Value, ServiceError> {
    let body = strip_fences(content);
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(80).collect();
        ServiceError::MalformedPayload(format!("{e} (got: {preview:?})"))
    })?;
    if !value.is_object() {
        return Err(ServiceError::MalformedPayload(format!(
            "expected a JSON object, got {value}"
        )));
    }
    Ok(value)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SkrivError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SkrivError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the API key is read
///    from the provider's usual environment variable.
/// 3. **`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`**, when both are set.
/// 4. **`OPENAI_API_KEY`** present → OpenAI.
/// 5. **[`ProviderFactory::from_env`]** auto-detection.
pub fn resolve_provider(config: &SessionConfig) -> Result<Arc<dyn LLMProvider>, SkrivError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SkrivError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
