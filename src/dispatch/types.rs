//! Conversation and dispatch data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ── Conversation ────────────────────────────────────────────────────

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Body of a turn. Code replies keep their language so the UI can
/// highlight them and history replay can use the raw snippet.
///
/// Serializes tagged by `type`. Deserializing also accepts a bare string,
/// read as plain text, which is what browser clients send in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnContent {
    PlainText { text: String },
    CodeSnippet { code: String, language: String },
}

impl<'de> Deserialize<'de> for TurnContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        enum Tagged {
            PlainText { text: String },
            CodeSnippet { code: String, language: String },
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Tagged(Tagged),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(text) | Wire::Tagged(Tagged::PlainText { text }) => {
                TurnContent::PlainText { text }
            }
            Wire::Tagged(Tagged::CodeSnippet { code, language }) => {
                TurnContent::CodeSnippet { code, language }
            }
        })
    }
}

impl TurnContent {
    pub fn text(text: impl Into<String>) -> Self {
        TurnContent::PlainText { text: text.into() }
    }

    pub fn code(code: impl Into<String>, language: impl Into<String>) -> Self {
        TurnContent::CodeSnippet {
            code: code.into(),
            language: language.into(),
        }
    }

    /// Text used when replaying this turn to a model.
    pub fn as_text(&self) -> &str {
        match self {
            TurnContent::PlainText { text } => text,
            TurnContent::CodeSnippet { code, .. } => code,
        }
    }
}

/// One message in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub role: TurnRole,
    pub content: TurnContent,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, content: TurnContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, TurnContent::text(text))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, TurnContent::text(text))
    }
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Input to a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Turns appended before this message, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    /// The user's new message.
    pub message: String,
    /// Attached image as a base64 data URI.
    #[serde(default)]
    pub image: Option<String>,
}

impl DispatchRequest {
    pub fn new(history: Vec<ConversationTurn>, message: impl Into<String>) -> Self {
        Self {
            history,
            message: message.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// The attached image, if one was actually supplied. An empty payload
    /// counts as no image.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|img| !img.is_empty())
    }
}

/// How the client should render a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Code,
}

/// Normalized outcome of a dispatch.
///
/// `language` is present exactly when `content_type` is `Code`; build
/// results through [`DispatchResult::text`] and [`DispatchResult::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub is_appropriate: bool,
    pub response: String,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl DispatchResult {
    pub fn text(response: impl Into<String>, is_appropriate: bool) -> Self {
        Self {
            is_appropriate,
            response: response.into(),
            content_type: ContentType::Text,
            language: None,
        }
    }

    pub fn code(
        response: impl Into<String>,
        language: impl Into<String>,
        is_appropriate: bool,
    ) -> Self {
        Self {
            is_appropriate,
            response: response.into(),
            content_type: ContentType::Code,
            language: Some(language.into()),
        }
    }

    /// Turn content for the assistant reply built from this result.
    pub fn to_turn_content(&self) -> TurnContent {
        match (&self.content_type, &self.language) {
            (ContentType::Code, Some(language)) => TurnContent::code(&self.response, language),
            _ => TurnContent::text(&self.response),
        }
    }
}

/// The response-generation strategies a dispatch can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    PredefinedAnswer,
    ImageQa,
    CodeGeneration,
    RealtimeSearch,
    GeneralChat,
}

impl Capability {
    pub fn label(&self) -> &'static str {
        match self {
            Capability::PredefinedAnswer => "predefined_answer",
            Capability::ImageQa => "image_qa",
            Capability::CodeGeneration => "code_generation",
            Capability::RealtimeSearch => "realtime_search",
            Capability::GeneralChat => "general_chat",
        }
    }

    /// Whether invoking this capability reaches the AI provider.
    pub fn is_external(&self) -> bool {
        !matches!(self, Capability::PredefinedAnswer)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
