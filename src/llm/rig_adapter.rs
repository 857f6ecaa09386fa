//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::CompletionModel;
use rig::message::{
    AssistantContent, ImageDetail, ImageMediaType, Message as RigMessage, MimeType, UserContent,
};
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::costs;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Adapter over any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        costs::model_cost(&self.model_name)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let max_tokens = request.max_tokens;
        let (preamble, mut history) = convert_messages(request.messages)?;
        let prompt = history
            .pop()
            .ok_or_else(|| LlmError::InvalidRequest("completion request has no messages".into()))?;

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "response contained no text".into(),
            });
        }

        let output_tokens = saturating_tokens(response.usage.output_tokens);
        Ok(CompletionResponse {
            content,
            input_tokens: saturating_tokens(response.usage.input_tokens),
            output_tokens,
            finish_reason: FinishReason::from_usage(output_tokens, max_tokens),
            response_id: None,
        })
    }
}

fn saturating_tokens(count: u64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Split system messages into a preamble and convert the rest to rig messages.
fn convert_messages(
    messages: Vec<ChatMessage>,
) -> Result<(Option<String>, Vec<RigMessage>), LlmError> {
    let mut system_parts = Vec::new();
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content),
            Role::Assistant => converted.push(RigMessage::assistant(message.content)),
            Role::User => match message.image {
                None => converted.push(RigMessage::user(message.content)),
                Some(image) => {
                    let media_type = ImageMediaType::from_mime_type(&image.media_type);
                    let parts = vec![
                        UserContent::image_base64(image.data, media_type, Some(ImageDetail::Auto)),
                        UserContent::text(message.content),
                    ];
                    let content = OneOrMany::many(parts)
                        .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;
                    converted.push(RigMessage::User { content });
                }
            },
        }
    }

    let preamble = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    Ok((preamble, converted))
}
