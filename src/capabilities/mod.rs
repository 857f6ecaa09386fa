//! Capability contracts and their LLM-backed adapters.
//!
//! Each capability is a one-shot request/response call to the AI provider.
//! The dispatcher only sees the traits, so tests can swap in stubs.

pub mod code_generation;
pub mod general_chat;
pub mod image_qa;
pub mod moderation;
pub mod realtime_search;

pub use code_generation::LlmCodeGeneration;
pub use general_chat::LlmGeneralChat;
pub use image_qa::LlmImageQa;
pub use moderation::LlmModerationCheck;
pub use realtime_search::{LlmRealtimeSearch, LlmSearchTool};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ChatPromptConfig, ModerationConfig};
use crate::dispatch::ConversationTurn;
use crate::error::CapabilityError;
use crate::llm::{CompletionRequest, FinishReason, LlmProvider};

// ── Contracts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageQuestion {
    /// Image as a base64 data URI.
    pub image: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeQuestion {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub code_snippet: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub search_results: String,
}

/// Raw output of the secondary search tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResults {
    pub results: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatQuestion {
    pub history: Vec<ConversationTurn>,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationInput {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationVerdict {
    pub is_appropriate: bool,
}

#[async_trait]
pub trait ImageQa: Send + Sync {
    async fn answer(&self, input: ImageQuestion) -> Result<ImageAnswer, CapabilityError>;
}

#[async_trait]
pub trait CodeGeneration: Send + Sync {
    async fn generate(&self, input: CodeQuestion) -> Result<CodeSnippet, CapabilityError>;
}

#[async_trait]
pub trait RealtimeSearch: Send + Sync {
    async fn search(&self, input: SearchQuery) -> Result<SearchResults, CapabilityError>;
}

/// Secondary lookup used by real-time search.
#[async_trait]
pub trait SearchTool: Send + Sync {
    async fn lookup(&self, input: SearchQuery) -> Result<ToolResults, CapabilityError>;
}

#[async_trait]
pub trait GeneralChat: Send + Sync {
    async fn answer(&self, input: ChatQuestion) -> Result<ChatAnswer, CapabilityError>;
}

#[async_trait]
pub trait ModerationCheck: Send + Sync {
    async fn classify(&self, input: ModerationInput)
    -> Result<ModerationVerdict, CapabilityError>;
}

/// The full set of adapters a dispatcher calls into.
#[derive(Clone)]
pub struct Capabilities {
    pub image_qa: Arc<dyn ImageQa>,
    pub code_generation: Arc<dyn CodeGeneration>,
    pub realtime_search: Arc<dyn RealtimeSearch>,
    pub general_chat: Arc<dyn GeneralChat>,
    pub moderation: Arc<dyn ModerationCheck>,
}

impl Capabilities {
    /// Wire every capability to a single provider.
    pub fn from_provider(
        llm: Arc<dyn LlmProvider>,
        chat: ChatPromptConfig,
        moderation: ModerationConfig,
    ) -> Self {
        let search_tool = Arc::new(LlmSearchTool::new(Arc::clone(&llm)));
        Self {
            image_qa: Arc::new(LlmImageQa::new(Arc::clone(&llm))),
            code_generation: Arc::new(LlmCodeGeneration::new(Arc::clone(&llm))),
            realtime_search: Arc::new(LlmRealtimeSearch::new(Arc::clone(&llm), search_tool)),
            general_chat: Arc::new(LlmGeneralChat::new(Arc::clone(&llm), chat)),
            moderation: Arc::new(LlmModerationCheck::new(llm, moderation)),
        }
    }
}

/// Run one completion for a capability and return the reply text.
pub(crate) async fn complete_text(
    llm: &dyn LlmProvider,
    capability: &'static str,
    request: CompletionRequest,
) -> Result<String, CapabilityError> {
    let response = llm
        .complete(request.with_metadata("capability", capability))
        .await
        .map_err(CapabilityError::provider(capability))?;

    debug!(
        capability,
        model = llm.model_name(),
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        cost = %response.cost(llm.cost_per_token()),
        "Capability call complete"
    );

    if response.finish_reason == FinishReason::Length {
        warn!(capability, "Response truncated at max_tokens");
    }

    Ok(response.content)
}
