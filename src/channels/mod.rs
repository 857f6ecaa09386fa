//! Outer surfaces: stdin REPL and HTTP API.

pub mod cli;
pub mod http;

pub use cli::CliChannel;
pub use http::{AppState, chat_routes};
