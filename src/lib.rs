//! Anthara: chat assistant core.

pub mod capabilities;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod session;
