//! General conversation with the Anthara persona.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ChatAnswer, ChatQuestion, GeneralChat, complete_text};
use crate::config::ChatPromptConfig;
use crate::dispatch::{ConversationTurn, TurnRole};
use crate::error::CapabilityError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const CAPABILITY: &str = "general_chat";

/// Persona chat that replays the session history.
pub struct LlmGeneralChat {
    llm: Arc<dyn LlmProvider>,
    config: ChatPromptConfig,
}

impl LlmGeneralChat {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ChatPromptConfig) -> Self {
        Self { llm, config }
    }

    fn build_messages(&self, history: &[ConversationTurn], question: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.config.system_prompt));
        messages.extend(history.iter().map(|turn| {
            let text = turn.content.as_text();
            match turn.role {
                TurnRole::User => ChatMessage::user(text),
                TurnRole::Assistant => ChatMessage::assistant(text),
            }
        }));
        messages.push(ChatMessage::user(question));
        messages
    }
}

#[async_trait]
impl GeneralChat for LlmGeneralChat {
    async fn answer(&self, input: ChatQuestion) -> Result<ChatAnswer, CapabilityError> {
        let request = CompletionRequest::new(self.build_messages(&input.history, &input.question))
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let answer = complete_text(self.llm.as_ref(), CAPABILITY, request).await?;
        if answer.trim().is_empty() {
            return Err(CapabilityError::MalformedResponse {
                capability: CAPABILITY,
                reason: "empty answer".into(),
            });
        }
        Ok(ChatAnswer { answer })
    }
}
