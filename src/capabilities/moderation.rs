//! Appropriateness classification for avatar expression.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{ModerationCheck, ModerationInput, ModerationVerdict, complete_text};
use crate::config::ModerationConfig;
use crate::error::CapabilityError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const CAPABILITY: &str = "moderation";

/// Classifier reply structure.
#[derive(Debug, Deserialize)]
struct VerdictResponse {
    #[serde(alias = "is_appropriate")]
    #[serde(rename = "isAppropriate")]
    is_appropriate: bool,
}

/// Moderation check that asks the model for a JSON verdict.
pub struct LlmModerationCheck {
    llm: Arc<dyn LlmProvider>,
    config: ModerationConfig,
}

impl LlmModerationCheck {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ModerationConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl ModerationCheck for LlmModerationCheck {
    async fn classify(
        &self,
        input: ModerationInput,
    ) -> Result<ModerationVerdict, CapabilityError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(self.config.system_prompt()),
            ChatMessage::user(format!("Text: {}", input.text)),
        ])
        .with_temperature(0.0)
        .with_max_tokens(self.config.max_tokens);

        let raw = complete_text(self.llm.as_ref(), CAPABILITY, request).await?;
        parse_verdict(&raw).map_err(|reason| {
            warn!(raw_response = %raw, error = %reason, "Failed to parse moderation verdict");
            CapabilityError::MalformedResponse {
                capability: CAPABILITY,
                reason,
            }
        })
    }
}

fn parse_verdict(raw: &str) -> Result<ModerationVerdict, String> {
    let json = extract_json_object(raw);
    let response: VerdictResponse =
        serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))?;
    Ok(ModerationVerdict {
        is_appropriate: response.is_appropriate,
    })
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    // Bare `"isAppropriate": false` without braces.
    if trimmed.contains(':') {
        return format!("{{{}}}", trimmed.trim_end_matches(','));
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::ScriptedLlm;

    #[test]
    fn parses_plain_object() {
        assert!(parse_verdict(r#"{"isAppropriate": true}"#).unwrap().is_appropriate);
        assert!(!parse_verdict(r#"{"isAppropriate": false}"#).unwrap().is_appropriate);
    }

    #[test]
    fn parses_snake_case_alias() {
        assert!(!parse_verdict(r#"{"is_appropriate": false}"#).unwrap().is_appropriate);
    }

    #[test]
    fn parses_markdown_wrapped() {
        let verdict = parse_verdict("```json\n{\"isAppropriate\": false}\n```").unwrap();
        assert!(!verdict.is_appropriate);
    }

    #[test]
    fn parses_bare_key_value() {
        let verdict = parse_verdict("\"isAppropriate\": false").unwrap();
        assert!(!verdict.is_appropriate);
    }

    #[test]
    fn rejects_prose() {
        assert!(parse_verdict("The text seems fine to me.").is_err());
    }

    #[tokio::test]
    async fn classify_includes_policy_and_text() {
        let llm = Arc::new(ScriptedLlm::reply(r#"{"isAppropriate": true}"#));
        let check = LlmModerationCheck::new(llm.clone(), ModerationConfig::default());

        let verdict = check
            .classify(ModerationInput {
                text: "hello there".into(),
            })
            .await
            .unwrap();
        assert!(verdict.is_appropriate);

        let request = llm.request(0);
        assert!(request.messages[0].content.contains("Category policy"));
        assert_eq!(request.messages[1].content, "Text: hello there");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn unparseable_reply_is_an_error() {
        let check = LlmModerationCheck::new(
            Arc::new(ScriptedLlm::reply("I cannot help with that.")),
            ModerationConfig::default(),
        );
        let err = check
            .classify(ModerationInput { text: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse { capability: "moderation", .. }));
    }
}
