//! System prompts for the language-model transforms.
//!
//! Every transform gets its own instruction block, followed by a shared
//! output contract that asks for a single JSON object carrying the kind's
//! result field. The request payload itself travels as the user message (see
//! [`user_message`]), so the prompts never interpolate user text.

use crate::document::Language;
use crate::operation::{OperationKind, OperationRequest};

pub const SUGGESTIONS_PROMPT: &str = r#"You are an AI writing coach that helps middle schoolers improve their writing by giving feedback based on the Swedish curriculum Lgr22.

Given the text in the request, provide a list of suggestions on how to improve it. The feedback should align with the goals for writing in Lgr22: clarity, structure, language variation, and adapting the text to purpose and audience. Every suggestion must be actionable and easy for a student to understand.

Start each suggestion with "Jag noterar..." (translated into the requested language) and write in a neutral, encouraging tone."#;

pub const BRAINSTORM_PROMPT: &str = r#"You are a creative writing assistant for elementary school students. Your goal is to give fun and engaging ideas that help them overcome writer's block.

Based on the text in `inputText`, generate three distinct and creative writing suggestions focusing on new ideas, characters or settings that could inspire the student to keep writing. The suggestions must differ enough to give a good set of options.

Write each suggestion as a single sentence."#;

pub const FACT_CHECK_PROMPT: &str = r#"You are an expert fact checker. You are given a text and a source URL. Compare the facts in the text against the information at the source URL and summarise the verification results: which claims are supported, which are contradicted, and which the source does not cover."#;

pub const GENERATE_INTRO_PROMPT: &str = r#"You are a creative writing assistant helping students write stories.

Generate one engaging introductory paragraph based on the idea given in `prompt`."#;

pub const CONTINUE_WRITING_PROMPT: &str = r#"You are a creative writing assistant. Continue the story given in `text`. Write one or two engaging paragraphs that follow logically from it.

Return only the new paragraphs, not the existing story."#;

pub const REWRITE_PROMPT: &str = r#"Rewrite the text given in `text` to improve its clarity and style. Keep the meaning and keep the language the text is written in."#;

pub const MAKE_LONGER_PROMPT: &str = r#"Expand the text given in `text` to make it longer and more detailed. Keep the meaning, voice and point of view."#;

pub const MAKE_SHORTER_PROMPT: &str = r#"Shorten the text given in `text` while preserving its core meaning."#;

/// Instruction block for `kind`.
pub fn instruction(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Suggestions => SUGGESTIONS_PROMPT,
        OperationKind::Brainstorm => BRAINSTORM_PROMPT,
        OperationKind::FactCheck => FACT_CHECK_PROMPT,
        OperationKind::GenerateIntro => GENERATE_INTRO_PROMPT,
        OperationKind::ContinueWriting => CONTINUE_WRITING_PROMPT,
        OperationKind::Rewrite => REWRITE_PROMPT,
        OperationKind::MakeLonger => MAKE_LONGER_PROMPT,
        OperationKind::MakeShorter => MAKE_SHORTER_PROMPT,
    }
}

/// English name of a language, as used inside prompts.
pub fn language_name(language: Language) -> &'static str {
    match language {
        Language::Swedish => "Swedish",
        Language::Bosnian => "Bosnian",
        Language::Croatian => "Croatian",
        Language::Serbian => "Serbian",
    }
}

/// Full system prompt for a request: instructions, language rule, output
/// contract.
pub fn system_prompt(request: &OperationRequest) -> String {
    let kind = request.kind();
    let mut prompt = String::from(instruction(kind));

    if let Some(language) = request.language() {
        prompt.push_str(&format!(
            "\n\nYour answer must be written in {} (language code \"{}\").",
            language_name(language),
            language.code()
        ));
    }

    let shape = match kind {
        OperationKind::Suggestions | OperationKind::Brainstorm => "an array of strings",
        _ => "a string",
    };
    prompt.push_str(&format!(
        "\n\nOUTPUT FORMAT\n\
         Respond with a single JSON object and nothing else. The object has exactly one field, \
         \"{}\", whose value is {}. Do NOT wrap the JSON in markdown fences and do NOT add commentary.",
        kind.result_field(),
        shape
    ));
    prompt
}

/// User message for a request: the wire payload as pretty JSON.
pub fn user_message(request: &OperationRequest) -> String {
    serde_json::to_string_pretty(&request.payload()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_an_instruction() {
        for kind in OperationKind::ALL {
            assert!(!instruction(kind).is_empty(), "{kind}");
        }
    }

    #[test]
    fn system_prompt_names_result_field_and_language() {
        let req = OperationRequest::MakeShorter {
            text: "lång text".into(),
            language: Language::Bosnian,
        };
        let prompt = system_prompt(&req);
        assert!(prompt.contains("\"shorterText\""));
        assert!(prompt.contains("Bosnian"));
        assert!(prompt.contains("a string"));
    }

    #[test]
    fn rewrite_has_no_language_rule() {
        let prompt = system_prompt(&OperationRequest::Rewrite { text: "x".into() });
        assert!(!prompt.contains("language code"));
        assert!(prompt.contains("\"rewrittenText\""));
    }

    #[test]
    fn user_message_carries_payload() {
        let req = OperationRequest::FactCheck {
            text: "Stockholm är Sveriges huvudstad".into(),
            source_url: "https://sv.wikipedia.org/wiki/Stockholm".into(),
        };
        let msg = user_message(&req);
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["sourceUrl"], "https://sv.wikipedia.org/wiki/Stockholm");
        assert!(parsed.get("kind").is_none());
    }
}
