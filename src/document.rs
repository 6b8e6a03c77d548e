//! The session document and the suggestion annotations attached to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language used for generated text and suggestions.
///
/// A closed set: Swedish, Bosnian, Croatian, Serbian. Serialised as the
/// two-letter code the prompt service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "sv")]
    Swedish,
    #[serde(rename = "bs")]
    Bosnian,
    #[serde(rename = "hr")]
    Croatian,
    #[serde(rename = "sr")]
    Serbian,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Swedish,
        Language::Bosnian,
        Language::Croatian,
        Language::Serbian,
    ];

    /// Two-letter code sent to the prompt service.
    pub fn code(self) -> &'static str {
        match self {
            Language::Swedish => "sv",
            Language::Bosnian => "bs",
            Language::Croatian => "hr",
            Language::Serbian => "sr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sv" => Ok(Language::Swedish),
            "bs" => Ok(Language::Bosnian),
            "hr" => Ok(Language::Croatian),
            "sr" => Ok(Language::Serbian),
            other => Err(format!(
                "unknown language '{other}' (expected one of sv, bs, hr, sr)"
            )),
        }
    }
}

/// The single in-memory document of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub language: Language,
}

impl Document {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    /// True when there is nothing but whitespace to work on.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One improvement note returned by the suggestions transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub body: String,
}

impl Suggestion {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl From<String> for Suggestion {
    fn from(body: String) -> Self {
        Self { body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_code() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        }
        assert_eq!(" HR ".parse::<Language>().unwrap(), Language::Croatian);
        assert!("en".parse::<Language>().is_err());
    }

    #[test]
    fn language_serialises_as_code() {
        assert_eq!(serde_json::to_string(&Language::Bosnian).unwrap(), "\"bs\"");
        let lang: Language = serde_json::from_str("\"sr\"").unwrap();
        assert_eq!(lang, Language::Serbian);
    }

    #[test]
    fn blank_document() {
        assert!(Document::default().is_blank());
        assert!(Document::new(" \n\t", Language::Swedish).is_blank());
        assert!(!Document::new("Hej", Language::Swedish).is_blank());
    }
}
