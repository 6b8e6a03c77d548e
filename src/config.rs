//! Session configuration.
//!
//! Every knob lives in [`SessionConfig`], built via [`SessionConfigBuilder`].
//! Callers set only what they care about; [`SessionConfigBuilder::build`]
//! validates the rest.

use crate::document::Language;
use crate::error::SkrivError;
use crate::observer::ObserverHandle;
use crate::pipeline::encode::DEFAULT_BASE_NAME;
use crate::pipeline::layout::PdfLayout;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a writing [`crate::Session`].
///
/// # Example
/// ```rust
/// use skrivsmart::{Language, SessionConfig};
///
/// let config = SessionConfig::builder()
///     .language(Language::Croatian)
///     .model("gpt-4.1-nano")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.language, Language::Croatian);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// Initial document language. Default: Swedish.
    pub language: Language,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// The transforms are creative writing tasks, so this sits well above
    /// what extraction work would use.
    pub temperature: f32,

    /// Maximum tokens per completion. Default: 2048.
    pub max_tokens: usize,

    /// Per-call timeout for the prompt service in seconds. Default: None
    /// (wait for the service to answer).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL uploads in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// File base name for exports. Default: `skrivsmart_dokument`.
    pub export_base_name: String,

    /// Page geometry of PDF exports.
    pub pdf_layout: PdfLayout,

    /// Lifecycle callbacks. Default: None.
    pub observer: Option<ObserverHandle>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 2048,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            export_base_name: DEFAULT_BASE_NAME.to_string(),
            pdf_layout: PdfLayout::default(),
            observer: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("language", &self.language)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("export_base_name", &self.export_base_name)
            .field("pdf_layout", &self.pdf_layout)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl fmt::Debug for SessionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionConfigBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn export_base_name(mut self, name: impl Into<String>) -> Self {
        self.config.export_base_name = name.into();
        self
    }

    pub fn pdf_layout(mut self, layout: PdfLayout) -> Self {
        self.config.pdf_layout = layout;
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, SkrivError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(SkrivError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(SkrivError::InvalidConfig(
                "api_timeout_secs must be ≥ 1 when set".into(),
            ));
        }
        let base = c.export_base_name.trim();
        if base.is_empty() || base.contains(['/', '\\']) {
            return Err(SkrivError::InvalidConfig(format!(
                "export base name must be a plain file name, got '{}'",
                c.export_base_name
            )));
        }
        c.pdf_layout.validate().map_err(SkrivError::InvalidConfig)?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SessionConfig::builder().build().unwrap();
        assert_eq!(c.language, Language::Swedish);
        assert_eq!(c.export_base_name, "skrivsmart_dokument");
        assert_eq!(c.api_timeout_secs, None);
        assert!(c.observer.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = SessionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(SessionConfig::builder().max_tokens(0).build().is_err());
        assert!(SessionConfig::builder().api_timeout_secs(0).build().is_err());
        assert!(SessionConfig::builder()
            .export_base_name("../etc/passwd")
            .build()
            .is_err());
        assert!(SessionConfig::builder().export_base_name("  ").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = SessionConfig::builder()
            .observer(Arc::new(crate::observer::NoopObserver))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn SessionObserver>"));
    }
}
