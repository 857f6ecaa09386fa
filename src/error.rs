//! Error types for Anthara.

use std::time::Duration;

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single capability call (image Q&A, code, search, chat, moderation).
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("{capability} call failed: {source}")]
    Provider {
        capability: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("{capability} returned a malformed response: {reason}")]
    MalformedResponse {
        capability: &'static str,
        reason: String,
    },

    #[error("{capability} rejected its input: {reason}")]
    InvalidInput {
        capability: &'static str,
        reason: String,
    },

    #[error("Search tool failed: {0}")]
    SearchTool(String),
}

impl CapabilityError {
    /// Wrap a provider error with the name of the capability that issued the call.
    pub fn provider(capability: &'static str) -> impl FnOnce(LlmError) -> Self {
        move |source| CapabilityError::Provider { capability, source }
    }
}

/// Dispatch errors. Only the selected capability can fail a dispatch;
/// moderation failures are absorbed before the join.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Capability {capability} failed: {source}")]
    CapabilityFailure {
        capability: crate::dispatch::Capability,
        #[source]
        source: CapabilityError,
    },
}

impl DispatchError {
    /// Whether the request itself was unusable, as opposed to a provider failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DispatchError::CapabilityFailure {
                source: CapabilityError::InvalidInput { .. },
                ..
            }
        )
    }
}

/// Channel-related errors (CLI, HTTP).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the assistant.
pub type Result<T> = std::result::Result<T, Error>;
