use std::sync::Arc;

use tokio::sync::Mutex;

use anthara::capabilities::Capabilities;
use anthara::channels::{AppState, CliChannel, chat_routes};
use anthara::config::AppConfig;
use anthara::dispatch::{Dispatcher, RouteTable};
use anthara::llm::create_provider;
use anthara::session::ChatSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    });

    eprintln!("🤖 Anthara v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.llm.model, config.llm.backend);

    let llm = create_provider(&config.llm)?;
    let capabilities =
        Capabilities::from_provider(llm, config.chat.clone(), config.moderation.clone());
    let dispatcher = Arc::new(Dispatcher::new(RouteTable::default_routes(), capabilities));
    let session = Arc::new(Mutex::new(ChatSession::new(Arc::clone(&dispatcher))));

    let server = match config.http_addr {
        Some(addr) => {
            let app = chat_routes(AppState {
                dispatcher: Arc::clone(&dispatcher),
                session: Arc::clone(&session),
            });
            let listener = tokio::net::TcpListener::bind(addr).await?;
            eprintln!("   Chat API: http://{}/api/chat", addr);
            tracing::info!(%addr, "HTTP server started");
            Some(tokio::spawn(async move { axum::serve(listener, app).await }))
        }
        None => {
            eprintln!("   Chat API: disabled");
            None
        }
    };

    if config.cli_enabled {
        eprintln!("   Type a message and press Enter. /image <path> <question>, /clear, /quit.\n");
        CliChannel::new(session).run().await?;
    } else if let Some(server) = server {
        server.await??;
    }

    Ok(())
}
