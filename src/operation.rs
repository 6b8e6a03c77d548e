//! Transform kinds, their wire payloads, validated results, and the
//! orchestrator's state.
//!
//! ## Wire contract
//!
//! Each [`OperationRequest`] variant serialises to the JSON object the prompt
//! service expects (camelCase field names). Each kind answers with an object
//! carrying exactly one named result field:
//!
//! | Kind | Request fields | Result field |
//! |------|----------------|--------------|
//! | suggestions      | `text`, `language`      | `suggestions: [string]` |
//! | brainstorm       | `inputText`, `language` | `suggestions: [string]` |
//! | fact-check       | `text`, `sourceUrl`     | `verificationResult`    |
//! | generate-intro   | `prompt`, `language`    | `generatedText`         |
//! | continue-writing | `text`, `language`      | `continuation`          |
//! | rewrite          | `text`                  | `rewrittenText`         |
//! | make-longer      | `text`, `language`      | `longerText`            |
//! | make-shorter     | `text`, `language`      | `shorterText`           |

use crate::document::Language;
use crate::error::OperationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One AI-backed text operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Suggestions,
    Brainstorm,
    FactCheck,
    GenerateIntro,
    ContinueWriting,
    Rewrite,
    MakeLonger,
    MakeShorter,
}

impl OperationKind {
    pub const ALL: [OperationKind; 8] = [
        OperationKind::Suggestions,
        OperationKind::Brainstorm,
        OperationKind::FactCheck,
        OperationKind::GenerateIntro,
        OperationKind::ContinueWriting,
        OperationKind::Rewrite,
        OperationKind::MakeLonger,
        OperationKind::MakeShorter,
    ];

    /// Stable kebab-case name, used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Suggestions => "suggestions",
            OperationKind::Brainstorm => "brainstorm",
            OperationKind::FactCheck => "fact-check",
            OperationKind::GenerateIntro => "generate-intro",
            OperationKind::ContinueWriting => "continue-writing",
            OperationKind::Rewrite => "rewrite",
            OperationKind::MakeLonger => "make-longer",
            OperationKind::MakeShorter => "make-shorter",
        }
    }

    /// The single field the prompt service must answer with.
    pub fn result_field(self) -> &'static str {
        match self {
            OperationKind::Suggestions | OperationKind::Brainstorm => "suggestions",
            OperationKind::FactCheck => "verificationResult",
            OperationKind::GenerateIntro => "generatedText",
            OperationKind::ContinueWriting => "continuation",
            OperationKind::Rewrite => "rewrittenText",
            OperationKind::MakeLonger => "longerText",
            OperationKind::MakeShorter => "shorterText",
        }
    }

    /// Whether a successful result overwrites or extends `Document.text`.
    pub fn mutates_text(self) -> bool {
        matches!(
            self,
            OperationKind::GenerateIntro
                | OperationKind::ContinueWriting
                | OperationKind::Rewrite
                | OperationKind::MakeLonger
                | OperationKind::MakeShorter
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transform request, shaped exactly like the prompt-service payload.
///
/// Transient: built right before dispatch and dropped once the call resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OperationRequest {
    Suggestions {
        text: String,
        language: Language,
    },
    Brainstorm {
        #[serde(rename = "inputText")]
        input_text: String,
        language: Language,
    },
    FactCheck {
        text: String,
        #[serde(rename = "sourceUrl")]
        source_url: String,
    },
    GenerateIntro {
        prompt: String,
        language: Language,
    },
    ContinueWriting {
        text: String,
        language: Language,
    },
    Rewrite {
        text: String,
    },
    MakeLonger {
        text: String,
        language: Language,
    },
    MakeShorter {
        text: String,
        language: Language,
    },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Suggestions { .. } => OperationKind::Suggestions,
            OperationRequest::Brainstorm { .. } => OperationKind::Brainstorm,
            OperationRequest::FactCheck { .. } => OperationKind::FactCheck,
            OperationRequest::GenerateIntro { .. } => OperationKind::GenerateIntro,
            OperationRequest::ContinueWriting { .. } => OperationKind::ContinueWriting,
            OperationRequest::Rewrite { .. } => OperationKind::Rewrite,
            OperationRequest::MakeLonger { .. } => OperationKind::MakeLonger,
            OperationRequest::MakeShorter { .. } => OperationKind::MakeShorter,
        }
    }

    /// The language carried by the request, if the kind accepts one.
    pub fn language(&self) -> Option<Language> {
        match self {
            OperationRequest::Suggestions { language, .. }
            | OperationRequest::Brainstorm { language, .. }
            | OperationRequest::GenerateIntro { language, .. }
            | OperationRequest::ContinueWriting { language, .. }
            | OperationRequest::MakeLonger { language, .. }
            | OperationRequest::MakeShorter { language, .. } => Some(*language),
            OperationRequest::FactCheck { .. } | OperationRequest::Rewrite { .. } => None,
        }
    }

    /// The payload object sent to the prompt service (without the `kind` tag).
    pub fn payload(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.remove("kind");
        }
        value
    }

    /// Reject the request before dispatch if its inputs cannot produce a
    /// meaningful transform.
    pub fn check_preconditions(&self) -> Result<(), OperationError> {
        let kind = self.kind();
        let fail = |reason: &str| {
            Err(OperationError::PreconditionFailed {
                kind,
                reason: reason.to_string(),
            })
        };

        match self {
            OperationRequest::FactCheck { text, source_url } => {
                if text.trim().is_empty() {
                    return fail("text is empty");
                }
                if !is_valid_source_url(source_url) {
                    return fail("source URL is not a valid http(s) URL");
                }
                Ok(())
            }
            OperationRequest::GenerateIntro { prompt, .. } => {
                if prompt.trim().is_empty() {
                    return fail("idea prompt is empty");
                }
                Ok(())
            }
            OperationRequest::Suggestions { text, .. }
            | OperationRequest::Brainstorm {
                input_text: text, ..
            }
            | OperationRequest::ContinueWriting { text, .. }
            | OperationRequest::Rewrite { text }
            | OperationRequest::MakeLonger { text, .. }
            | OperationRequest::MakeShorter { text, .. } => {
                if text.trim().is_empty() {
                    return fail("text is empty");
                }
                Ok(())
            }
        }
    }
}

/// Syntactic URL check for fact-checking sources: must parse and use http(s).
pub fn is_valid_source_url(candidate: &str) -> bool {
    match reqwest::Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// A validated prompt-service response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OperationResult {
    Suggestions {
        suggestions: Vec<String>,
    },
    Brainstorm {
        suggestions: Vec<String>,
    },
    FactCheck {
        #[serde(rename = "verificationResult")]
        verification_result: String,
    },
    GenerateIntro {
        #[serde(rename = "generatedText")]
        generated_text: String,
    },
    ContinueWriting {
        continuation: String,
    },
    Rewrite {
        #[serde(rename = "rewrittenText")]
        rewritten_text: String,
    },
    MakeLonger {
        #[serde(rename = "longerText")]
        longer_text: String,
    },
    MakeShorter {
        #[serde(rename = "shorterText")]
        shorter_text: String,
    },
}

#[derive(Deserialize)]
struct ListField {
    suggestions: Vec<String>,
}

impl OperationResult {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationResult::Suggestions { .. } => OperationKind::Suggestions,
            OperationResult::Brainstorm { .. } => OperationKind::Brainstorm,
            OperationResult::FactCheck { .. } => OperationKind::FactCheck,
            OperationResult::GenerateIntro { .. } => OperationKind::GenerateIntro,
            OperationResult::ContinueWriting { .. } => OperationKind::ContinueWriting,
            OperationResult::Rewrite { .. } => OperationKind::Rewrite,
            OperationResult::MakeLonger { .. } => OperationKind::MakeLonger,
            OperationResult::MakeShorter { .. } => OperationKind::MakeShorter,
        }
    }

    /// Validate a raw response object for `kind`.
    ///
    /// The object must carry the kind's result field with the right type.
    /// Unrelated extra fields are ignored.
    pub fn from_response(
        kind: OperationKind,
        response: serde_json::Value,
    ) -> Result<Self, OperationError> {
        let field = kind.result_field();
        let obj = response
            .as_object()
            .ok_or_else(|| invalid(kind, format!("expected a JSON object, got {response}")))?;
        let value = obj
            .get(field)
            .ok_or_else(|| invalid(kind, format!("missing field '{field}'")))?;
        let text = || -> Result<String, OperationError> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(kind, format!("field '{field}' must be a string")))
        };

        let result = match kind {
            OperationKind::Suggestions => OperationResult::Suggestions {
                suggestions: parse_field::<ListField>(kind, &response)?.suggestions,
            },
            OperationKind::Brainstorm => OperationResult::Brainstorm {
                suggestions: parse_field::<ListField>(kind, &response)?.suggestions,
            },
            OperationKind::FactCheck => OperationResult::FactCheck {
                verification_result: text()?,
            },
            OperationKind::GenerateIntro => OperationResult::GenerateIntro {
                generated_text: text()?,
            },
            OperationKind::ContinueWriting => OperationResult::ContinueWriting {
                continuation: text()?,
            },
            OperationKind::Rewrite => OperationResult::Rewrite {
                rewritten_text: text()?,
            },
            OperationKind::MakeLonger => OperationResult::MakeLonger {
                longer_text: text()?,
            },
            OperationKind::MakeShorter => OperationResult::MakeShorter {
                shorter_text: text()?,
            },
        };
        Ok(result)
    }
}

fn parse_field<T: DeserializeOwned>(
    kind: OperationKind,
    response: &serde_json::Value,
) -> Result<T, OperationError> {
    serde_json::from_value(response.clone()).map_err(|e| invalid(kind, e.to_string()))
}

fn invalid(kind: OperationKind, detail: String) -> OperationError {
    OperationError::InvalidResponse { kind, detail }
}

/// The orchestrator's state. Exactly one transform may be `Busy` at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum OperationState {
    #[default]
    Idle,
    Busy {
        kind: OperationKind,
    },
    Succeeded {
        kind: OperationKind,
        result: OperationResult,
    },
    Failed {
        kind: OperationKind,
        error: OperationError,
    },
}

impl OperationState {
    pub fn is_busy(&self) -> bool {
        matches!(self, OperationState::Busy { .. })
    }

    /// The kind the state refers to, `None` when idle.
    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            OperationState::Idle => None,
            OperationState::Busy { kind }
            | OperationState::Succeeded { kind, .. }
            | OperationState::Failed { kind, .. } => Some(*kind),
        }
    }
}
