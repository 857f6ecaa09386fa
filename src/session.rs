//! In-memory chat session.
//!
//! Owns the conversation history for the lifetime of the process. Each
//! submission snapshots the history, dispatches, then appends the user turn
//! and the assistant reply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::dispatch::{ConversationTurn, DispatchRequest, Dispatcher, TurnContent, TurnRole};

/// Shown to the user when a dispatch fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Avatar expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Happy,
    Angry,
}

impl Emotion {
    pub fn from_appropriate(is_appropriate: bool) -> Self {
        if is_appropriate {
            Emotion::Happy
        } else {
            Emotion::Angry
        }
    }
}

/// What the client renders after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReply {
    pub turn: ConversationTurn,
    pub emotion: Emotion,
    /// The reply is the generic failure message.
    pub failed: bool,
}

/// A single user's conversation.
pub struct ChatSession {
    dispatcher: Arc<Dispatcher>,
    history: Vec<ConversationTurn>,
    emotion: Emotion,
}

impl ChatSession {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            history: Vec::new(),
            emotion: Emotion::default(),
        }
    }

    /// Submit a user message (and optional image data URI).
    ///
    /// Dispatch failures are logged and turned into the fallback reply with
    /// an angry expression; they are never returned.
    pub async fn submit(&mut self, message: &str, image: Option<String>) -> SessionReply {
        let mut request = DispatchRequest::new(self.history.clone(), message);
        if let Some(image) = image {
            request = request.with_image(image);
        }
        self.history.push(ConversationTurn::user(message));

        let (turn, failed) = match self.dispatcher.dispatch(request).await {
            Ok(result) => {
                self.emotion = Emotion::from_appropriate(result.is_appropriate);
                (
                    ConversationTurn::new(TurnRole::Assistant, result.to_turn_content()),
                    false,
                )
            }
            Err(e) => {
                error!(error = %e, "Error getting response from AI");
                self.emotion = Emotion::Angry;
                (ConversationTurn::assistant(FALLBACK_REPLY), true)
            }
        };

        self.history.push(turn.clone());
        info!(
            turns = self.history.len(),
            emotion = ?self.emotion,
            failed,
            "Session updated"
        );

        SessionReply {
            turn,
            emotion: self.emotion,
            failed,
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    /// Forget the conversation and reset the expression.
    pub fn clear(&mut self) {
        self.history.clear();
        self.emotion = Emotion::default();
    }
}

/// Render a turn for plain-text output (code goes in a fenced block).
pub fn render_turn(turn: &ConversationTurn) -> String {
    match &turn.content {
        TurnContent::PlainText { text } => text.clone(),
        TurnContent::CodeSnippet { code, language } => format!("```{language}\n{code}\n```"),
    }
}
