//! Route table: decides which capability answers a message.
//!
//! Evaluated top to bottom, first match wins:
//! 1. Canned trigger phrase → predefined answer
//! 2. Empty history → greeting
//! 3. Image attached → image Q&A
//! 4. Code keyword → code generation
//! 5. Real-time keyword → real-time search
//! 6. Otherwise → general chat
//!
//! Matching is plain substring containment on the lower-cased message. A
//! keyword embedded in a longer word still matches ("javascript" contains
//! "java", "cat#5" does not contain "c#" but "abc#" does).

use tracing::debug;

use crate::dispatch::types::{Capability, DispatchRequest};

const GREETING: &str = "Hi there, I'm Anthara! 👋\n\n\
Ask me a question, request a code snippet, check on today's news, or share an image and I'll take a look. 😊";

const CODE_KEYWORDS: &[&str] = &[
    "code",
    "snippet",
    "function",
    "method",
    "class",
    "javascript",
    "python",
    "react",
    "typescript",
    "java",
    "c#",
    "c++",
    "html",
    "css",
    "sql",
    "query",
    "algorithm",
];

const REALTIME_KEYWORDS: &[&str] = &[
    "latest",
    "current",
    "news",
    "today",
    "what is the score",
    "who is winning",
    "stock price",
    "weather forecast",
];

/// A fixed reply triggered by any of its phrases.
#[derive(Debug, Clone)]
pub struct CannedAnswer {
    /// Lower-case trigger phrases.
    pub triggers: Vec<String>,
    pub answer: String,
}

/// The capability chosen for one request, with anything it needs that
/// the route table already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Predefined { answer: String },
    ImageQa { image: String },
    CodeGeneration,
    RealtimeSearch,
    GeneralChat,
}

impl Route {
    pub fn capability(&self) -> Capability {
        match self {
            Route::Predefined { .. } => Capability::PredefinedAnswer,
            Route::ImageQa { .. } => Capability::ImageQa,
            Route::CodeGeneration => Capability::CodeGeneration,
            Route::RealtimeSearch => Capability::RealtimeSearch,
            Route::GeneralChat => Capability::GeneralChat,
        }
    }
}

/// Priority-ordered routing rules.
#[derive(Debug, Clone)]
pub struct RouteTable {
    canned: Vec<CannedAnswer>,
    greeting: String,
    code_keywords: Vec<String>,
    realtime_keywords: Vec<String>,
}

impl RouteTable {
    /// Route table with Anthara's canned answers and keyword sets.
    pub fn default_routes() -> Self {
        let canned = vec![
            CannedAnswer {
                triggers: vec!["who made you".into()],
                answer: "I was created by Anubhav, Daksh, and Johann.\n\n\
                         I'm built with Next.js, React, and Tailwind CSS. 🚀"
                    .into(),
            },
            CannedAnswer {
                triggers: vec!["what are you worth".into(), "what is your value".into()],
                answer: "As an AI, I don't have a monetary value. My worth is in helping you! 😊"
                    .into(),
            },
            CannedAnswer {
                triggers: vec!["technical background".into()],
                answer: "I'm built on a modern tech stack including Next.js, React, \
                         Tailwind CSS, and ShadCN UI. 🚀"
                    .into(),
            },
        ];

        Self {
            canned,
            greeting: GREETING.to_string(),
            code_keywords: CODE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            realtime_keywords: REALTIME_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Add a canned answer. Triggers are lower-cased; new entries are
    /// checked after the existing ones.
    pub fn add_canned(&mut self, triggers: &[&str], answer: impl Into<String>) {
        self.canned.push(CannedAnswer {
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
            answer: answer.into(),
        });
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Pick the route for a request. Pure: no I/O, no state.
    pub fn select(&self, request: &DispatchRequest) -> Route {
        let lower = request.message.to_lowercase();

        if let Some(canned) = self
            .canned
            .iter()
            .find(|c| c.triggers.iter().any(|t| lower.contains(t.as_str())))
        {
            debug!("Message matched canned trigger");
            return Route::Predefined {
                answer: canned.answer.clone(),
            };
        }

        if request.history.is_empty() {
            return Route::Predefined {
                answer: self.greeting.clone(),
            };
        }

        if let Some(image) = request.image() {
            return Route::ImageQa {
                image: image.to_string(),
            };
        }

        if contains_any(&lower, &self.code_keywords) {
            return Route::CodeGeneration;
        }

        if contains_any(&lower, &self.realtime_keywords) {
            return Route::RealtimeSearch;
        }

        Route::GeneralChat
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::default_routes()
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}
