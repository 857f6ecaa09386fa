//! REST endpoints for the browser UI.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::session::ChatSession;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub session: Arc<Mutex<ChatSession>>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Build the Axum router.
pub fn chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dispatch", post(dispatch))
        .route("/api/chat", post(chat))
        .route("/api/chat/history", get(history).delete(clear_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "anthara"
    }))
}

/// POST /api/dispatch
///
/// Stateless: the caller supplies the history. An unusable payload (such as
/// a malformed image) maps to 400; provider failures map to 502 so the UI
/// can show its generic error message.
async fn dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> impl IntoResponse {
    match state.dispatcher.dispatch(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            let status = if e.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            warn!(error = %e, %status, "Dispatch failed");
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}

/// POST /api/chat
///
/// Submits to the process-wide session and returns the assistant turn.
async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> impl IntoResponse {
    if body.message.trim().is_empty() && body.image.as_deref().is_none_or(str::is_empty) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "message must not be empty"})),
        )
            .into_response();
    }

    let reply = state
        .session
        .lock()
        .await
        .submit(&body.message, body.image)
        .await;
    info!(failed = reply.failed, "Chat reply sent");
    Json(reply).into_response()
}

/// GET /api/chat/history
async fn history(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(serde_json::json!({
        "turns": session.history(),
        "emotion": session.emotion(),
    }))
}

/// DELETE /api/chat/history
async fn clear_history(State(state): State<AppState>) -> impl IntoResponse {
    state.session.lock().await.clear();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::capabilities::Capabilities;
    use crate::capabilities::testing::ScriptedLlm;
    use crate::config::{ChatPromptConfig, ModerationConfig};
    use crate::dispatch::RouteTable;

    fn app(llm: ScriptedLlm) -> Router {
        let capabilities = Capabilities::from_provider(
            Arc::new(llm),
            ChatPromptConfig::default(),
            ModerationConfig::default(),
        );
        let dispatcher = Arc::new(Dispatcher::new(RouteTable::default_routes(), capabilities));
        let session = Arc::new(Mutex::new(ChatSession::new(Arc::clone(&dispatcher))));
        chat_routes(AppState {
            dispatcher,
            session,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app(ScriptedLlm::new(vec![]))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "anthara");
    }

    #[tokio::test]
    async fn dispatch_canned_answer_only_calls_moderation() {
        let response = app(ScriptedLlm::reply(r#"{"isAppropriate": true}"#))
            .oneshot(
                Request::post("/api/dispatch")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "Who made you?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["contentType"], "text");
        assert_eq!(body["isAppropriate"], true);
        assert!(body["response"].as_str().unwrap().contains("Anubhav"));
    }

    #[tokio::test]
    async fn empty_chat_message_is_rejected() {
        let response = app(ScriptedLlm::new(vec![]))
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_message_with_empty_image_is_rejected() {
        let llm = ScriptedLlm::new(vec![]);
        let response = app(llm)
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "  ", "image": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_image_is_a_bad_request() {
        let body = serde_json::json!({
            "history": [{"role": "user", "content": "hi"}],
            "message": "what is in this picture?",
            "image": "not-a-data-uri"
        });
        let response = app(ScriptedLlm::reply(r#"{"isAppropriate": true}"#))
            .oneshot(
                Request::post("/api/dispatch")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(response).await["error"]
                .as_str()
                .unwrap()
                .contains("image_qa")
        );
    }

    #[tokio::test]
    async fn clearing_history_returns_no_content() {
        let response = app(ScriptedLlm::new(vec![]))
            .oneshot(
                Request::delete("/api/chat/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
