//! Request routing for chat messages.
//!
//! Every user message flows through:
//! 1. `RouteTable::select()`: priority-ordered substring rules (no LLM)
//! 2. `Dispatcher::dispatch()`: invokes the one selected capability while
//!    the moderation check runs on its own task
//!
//! Moderation is advisory: it only drives the avatar's expression.

pub mod dispatcher;
pub mod rules;
pub mod types;

pub use dispatcher::Dispatcher;
pub use rules::{Route, RouteTable};
pub use types::*;
