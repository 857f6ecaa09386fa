//! Configuration types.
//!
//! Prompt text and the moderation safety table are immutable values handed to
//! the capability adapters at construction time.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Persona prompt used for general chat.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Anthara, a smart and engaging AI assistant.\n\
Your personality is friendly and helpful. You often use emojis to make the conversation feel more natural and friendly. 😊\n\n\
When presenting information, use line breaks to separate different points instead of mixing them into long paragraphs.\n\n\
If the user's question is vague, ask for more details to better understand what they need.";

/// Instruction used by the moderation classifier.
pub const DEFAULT_MODERATION_PROMPT: &str = "You are an AI assistant that determines whether a given text is appropriate or not. \
Appropriate means that it does not contain profanity, hate speech, sexually suggestive content, or dangerous topics.\n\n\
Respond with {\"isAppropriate\": true} if the text is appropriate, and {\"isAppropriate\": false} if it is not. \
Do not include any other explanation.";

/// Harm categories the moderation classifier is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmCategory {
    HateSpeech,
    DangerousContent,
    Harassment,
    SexuallyExplicit,
}

impl HarmCategory {
    pub fn label(&self) -> &'static str {
        match self {
            HarmCategory::HateSpeech => "hate speech",
            HarmCategory::DangerousContent => "dangerous content",
            HarmCategory::Harassment => "harassment",
            HarmCategory::SexuallyExplicit => "sexually explicit content",
        }
    }
}

/// How aggressively a category is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl BlockThreshold {
    pub fn label(&self) -> &'static str {
        match self {
            BlockThreshold::BlockNone => "never flag",
            BlockThreshold::BlockOnlyHigh => "flag only high-severity cases",
            BlockThreshold::BlockMediumAndAbove => "flag medium severity and above",
            BlockThreshold::BlockLowAndAbove => "flag even low-severity cases",
        }
    }
}

/// One row of the safety threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: BlockThreshold,
}

/// Prompt configuration for the general chat capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPromptConfig {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatPromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Prompt and threshold configuration for the moderation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationConfig {
    pub prompt: String,
    pub safety_settings: Vec<SafetySetting>,
    pub max_tokens: u32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_MODERATION_PROMPT.to_string(),
            safety_settings: vec![
                SafetySetting {
                    category: HarmCategory::HateSpeech,
                    threshold: BlockThreshold::BlockOnlyHigh,
                },
                SafetySetting {
                    category: HarmCategory::DangerousContent,
                    threshold: BlockThreshold::BlockNone,
                },
                SafetySetting {
                    category: HarmCategory::Harassment,
                    threshold: BlockThreshold::BlockMediumAndAbove,
                },
                SafetySetting {
                    category: HarmCategory::SexuallyExplicit,
                    threshold: BlockThreshold::BlockLowAndAbove,
                },
            ],
            max_tokens: 32,
        }
    }
}

impl ModerationConfig {
    /// Full system prompt: instruction followed by the per-category policy.
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.prompt.clone();
        if !self.safety_settings.is_empty() {
            prompt.push_str("\n\nCategory policy:\n");
            for setting in &self.safety_settings {
                prompt.push_str(&format!(
                    "- {}: {}\n",
                    setting.category.label(),
                    setting.threshold.label()
                ));
            }
        }
        prompt
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub chat: ChatPromptConfig,
    pub moderation: ModerationConfig,
    /// Address for the HTTP API; `None` disables it.
    pub http_addr: Option<SocketAddr>,
    /// Whether to run the stdin REPL.
    pub cli_enabled: bool,
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// - `ANTHARA_BACKEND`: `anthropic` (default) or `openai`
    /// - `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`: required for the chosen backend
    /// - `ANTHARA_MODEL`: model name (backend default otherwise)
    /// - `ANTHARA_SYSTEM_PROMPT`: overrides the chat persona prompt
    /// - `ANTHARA_HTTP`: `false` disables the HTTP API
    /// - `ANTHARA_PORT`: HTTP port (default 8080)
    /// - `ANTHARA_CLI`: `false` disables the stdin REPL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("ANTHARA_BACKEND") {
            Some(raw) => raw.parse::<LlmBackend>().map_err(|message| ConfigError::InvalidValue {
                key: "ANTHARA_BACKEND".into(),
                message,
            })?,
            None => LlmBackend::Anthropic,
        };

        let key_var = backend.api_key_var();
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = lookup("ANTHARA_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| backend.default_model().to_string());

        let mut chat = ChatPromptConfig::default();
        if let Some(prompt) = lookup("ANTHARA_SYSTEM_PROMPT").filter(|p| !p.trim().is_empty()) {
            chat.system_prompt = prompt;
        }

        let http_enabled = parse_flag(lookup("ANTHARA_HTTP"), "ANTHARA_HTTP")?.unwrap_or(true);
        let http_addr = if http_enabled {
            let port = match lookup("ANTHARA_PORT") {
                Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                    key: "ANTHARA_PORT".into(),
                    message: e.to_string(),
                })?,
                None => 8080,
            };
            Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
        } else {
            None
        };

        let cli_enabled = parse_flag(lookup("ANTHARA_CLI"), "ANTHARA_CLI")?.unwrap_or(true);

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: secrecy::SecretString::from(api_key),
                model,
            },
            chat,
            moderation: ModerationConfig::default(),
            http_addr,
            cli_enabled,
        })
    }
}

fn parse_flag(raw: Option<String>, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
