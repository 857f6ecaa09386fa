//! Image question answering.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ImageAnswer, ImageQa, ImageQuestion, complete_text};
use crate::error::CapabilityError;
use crate::llm::{ChatMessage, CompletionRequest, ImageAttachment, LlmProvider};

const CAPABILITY: &str = "image_qa";

const SYSTEM_PROMPT: &str = "You are an AI assistant that answers questions about images.\n\n\
You will be given an image and a question about the image. \
Answer the question based on the content of the image.";

/// Answers questions about an attached image with a vision-capable model.
pub struct LlmImageQa {
    llm: Arc<dyn LlmProvider>,
}

impl LlmImageQa {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ImageQa for LlmImageQa {
    async fn answer(&self, input: ImageQuestion) -> Result<ImageAnswer, CapabilityError> {
        let image = ImageAttachment::from_data_uri(&input.image).map_err(|e| {
            CapabilityError::InvalidInput {
                capability: CAPABILITY,
                reason: e.to_string(),
            }
        })?;

        let request = CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Question: {}", input.question)).with_image(image),
        ])
        .with_max_tokens(1024);

        let answer = complete_text(self.llm.as_ref(), CAPABILITY, request).await?;
        Ok(ImageAnswer {
            answer: answer.trim().to_string(),
        })
    }
}
