//! CLI channel: stdin/stdout REPL for local testing.

use std::path::Path;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::error::ChannelError;
use crate::session::{ChatSession, Emotion, render_turn};

/// A parsed line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Clear,
    Image { path: &'a str, question: &'a str },
    Message(&'a str),
    Empty,
}

fn parse_line(line: &str) -> Command<'_> {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        "/quit" | "/exit" => Command::Quit,
        "/clear" => Command::Clear,
        _ => match line.strip_prefix("/image ") {
            Some(rest) => {
                let rest = rest.trim_start();
                let (path, question) = rest.split_once(' ').unwrap_or((rest, ""));
                Command::Image {
                    path,
                    question: question.trim(),
                }
            }
            None => Command::Message(line),
        },
    }
}

/// Read an image file into a base64 data URI.
async fn load_image(path: &Path) -> Result<String, ChannelError> {
    let bytes = tokio::fs::read(path).await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(ChannelError::InvalidMessage(format!(
            "{} is not an image ({})",
            path.display(),
            mime
        )));
    }
    Ok(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
}

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    session: Arc<Mutex<ChatSession>>,
}

impl CliChannel {
    pub fn new(session: Arc<Mutex<ChatSession>>) -> Self {
        Self { session }
    }

    /// Run until EOF or `/quit`.
    pub async fn run(&self) -> Result<(), ChannelError> {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        eprint!("> ");
        while let Some(line) = lines.next_line().await? {
            let (message, image) = match parse_line(&line) {
                Command::Empty => {
                    eprint!("> ");
                    continue;
                }
                Command::Quit => break,
                Command::Clear => {
                    self.session.lock().await.clear();
                    eprintln!("🧹 Conversation cleared");
                    eprint!("> ");
                    continue;
                }
                Command::Image { path, question } => match load_image(Path::new(path)).await {
                    Ok(uri) => (question.to_string(), Some(uri)),
                    Err(e) => {
                        eprintln!("❌ {}", e);
                        eprint!("> ");
                        continue;
                    }
                },
                Command::Message(text) => (text.to_string(), None),
            };

            eprintln!("⏳ Thinking...");
            let reply = self.session.lock().await.submit(&message, image).await;
            let face = match reply.emotion {
                Emotion::Happy => "😊",
                Emotion::Angry => "😠",
            };
            println!("\n{} {}\n", face, render_turn(&reply.turn));
            eprint!("> ");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("   "), Command::Empty);
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/clear "), Command::Clear);
        assert_eq!(parse_line(" hello there "), Command::Message("hello there"));
    }

    #[test]
    fn parses_image_command() {
        assert_eq!(
            parse_line("/image ./cat.png what animal is this?"),
            Command::Image {
                path: "./cat.png",
                question: "what animal is this?"
            }
        );
        assert_eq!(
            parse_line("/image cat.png"),
            Command::Image {
                path: "cat.png",
                question: ""
            }
        );
    }

    #[tokio::test]
    async fn loads_image_as_data_uri() {
        let path = std::env::temp_dir().join(format!("anthara-{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

        let uri = load_image(&path).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_non_image_files() {
        let path = std::env::temp_dir().join(format!("anthara-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"hello").await.unwrap();

        assert!(matches!(
            load_image(&path).await,
            Err(ChannelError::InvalidMessage(_))
        ));
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
