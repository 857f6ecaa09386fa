//! Provider-neutral LLM types and the `LlmProvider` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// An inline image sent alongside a user message.
///
/// The UI hands images over as data URIs (`data:<mime>;base64,<data>`);
/// providers want the media type and the base64 body separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImageAttachment {
    /// Parse a base64 data URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, LlmError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| LlmError::InvalidRequest("image payload is not a data URI".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| LlmError::InvalidRequest("data URI has no payload".into()))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            LlmError::InvalidRequest("data URI must use base64 encoding".into())
        })?;

        if media_type.is_empty() {
            return Err(LlmError::InvalidRequest(
                "data URI is missing a MIME type".into(),
            ));
        }
        if data.is_empty() {
            return Err(LlmError::InvalidRequest("data URI payload is empty".into()));
        }

        Ok(Self {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Render back to `data:<mime>;base64,<data>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Optional image (user messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            image: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image: None,
        }
    }

    /// Attach an image to this message.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// A plain completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub metadata: HashMap<String, String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
}

impl FinishReason {
    /// Infer the finish reason from token usage. A reply that used the
    /// whole `max_tokens` budget is treated as truncated.
    pub fn from_usage(output_tokens: u32, max_tokens: Option<u32>) -> Self {
        match max_tokens {
            Some(max) if output_tokens >= max => FinishReason::Length,
            _ => FinishReason::Stop,
        }
    }
}

/// Response from a plain completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: FinishReason,
    pub response_id: Option<String>,
}

impl CompletionResponse {
    /// Estimated cost of this response given per-token prices.
    pub fn cost(&self, (input_price, output_price): (Decimal, Decimal)) -> Decimal {
        input_price * Decimal::from(self.input_tokens)
            + output_price * Decimal::from(self.output_tokens)
    }
}

/// A completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// (input, output) price per token in USD.
    fn cost_per_token(&self) -> (Decimal, Decimal);

    /// Run a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_png_data_uri() {
        let image = ImageAttachment::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn rejects_non_data_uri() {
        let err = ImageAttachment::from_data_uri("https://example.com/cat.png").unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_non_base64_data_uri() {
        assert!(ImageAttachment::from_data_uri("data:image/png,rawbytes").is_err());
    }

    #[test]
    fn rejects_missing_mime_or_payload() {
        assert!(ImageAttachment::from_data_uri("data:;base64,abcd").is_err());
        assert!(ImageAttachment::from_data_uri("data:image/jpeg;base64,").is_err());
    }

    #[test]
    fn request_builder_sets_options() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.2)
            .with_max_tokens(64)
            .with_metadata("capability", "general_chat");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.metadata["capability"], "general_chat");
    }

    #[test]
    fn exhausted_token_budget_means_truncated() {
        assert_eq!(FinishReason::from_usage(64, Some(64)), FinishReason::Length);
        assert_eq!(FinishReason::from_usage(63, Some(64)), FinishReason::Stop);
        assert_eq!(FinishReason::from_usage(5000, None), FinishReason::Stop);
    }

    #[test]
    fn response_cost_uses_both_prices() {
        let response = CompletionResponse {
            content: String::new(),
            input_tokens: 1000,
            output_tokens: 100,
            finish_reason: FinishReason::Stop,
            response_id: None,
        };
        let cost = response.cost((Decimal::new(3, 6), Decimal::new(15, 6)));
        assert_eq!(cost, Decimal::new(45, 4));
    }
}
