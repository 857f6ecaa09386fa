//! Dispatcher: routes one user message to one capability while the
//! moderation check runs alongside it.
//!
//! Flow:
//! 1. Spawn the moderation task (its failures resolve to "appropriate";
//!    it is aborted if the dispatch is dropped)
//! 2. Route table picks exactly one capability
//! 3. Invoke it (no retries; failure fails the dispatch)
//! 4. Join both and assemble a `DispatchResult`

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capabilities::{
    Capabilities, ChatQuestion, CodeQuestion, ImageQuestion, ModerationCheck, ModerationInput,
    SearchQuery,
};
use crate::dispatch::rules::{Route, RouteTable};
use crate::dispatch::types::{DispatchRequest, DispatchResult};
use crate::error::{CapabilityError, DispatchError};

/// Reply produced by a capability before moderation is folded in.
#[derive(Debug)]
enum Reply {
    Text(String),
    Code { code: String, language: String },
}

impl Reply {
    fn into_result(self, is_appropriate: bool) -> DispatchResult {
        match self {
            Reply::Text(text) => DispatchResult::text(text, is_appropriate),
            Reply::Code { code, language } => DispatchResult::code(code, language, is_appropriate),
        }
    }
}

/// Routes messages and joins capability output with moderation.
pub struct Dispatcher {
    routes: RouteTable,
    capabilities: Capabilities,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, capabilities: Capabilities) -> Self {
        Self {
            routes,
            capabilities,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handle one user message.
    ///
    /// Always waits for both the capability and the moderation check. A
    /// capability failure fails the whole call; a moderation failure only
    /// defaults `is_appropriate` to `true`.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResult, DispatchError> {
        let moderation = spawn_moderation(
            Arc::clone(&self.capabilities.moderation),
            request.message.clone(),
        );

        let route = self.routes.select(&request);
        let capability = route.capability();
        info!(
            capability = %capability,
            history_len = request.history.len(),
            has_image = request.image().is_some(),
            "Dispatching message"
        );

        let (reply, is_appropriate) =
            tokio::join!(self.invoke(route, request), join_moderation(moderation));

        let reply = reply.map_err(|source| {
            error!(capability = %capability, error = %source, "Capability failed");
            DispatchError::CapabilityFailure { capability, source }
        })?;

        debug!(capability = %capability, is_appropriate, "Dispatch complete");
        Ok(reply.into_result(is_appropriate))
    }

    /// Run the selected capability. Exactly one external call for every
    /// route except predefined answers.
    async fn invoke(&self, route: Route, request: DispatchRequest) -> Result<Reply, CapabilityError> {
        let DispatchRequest {
            history, message, ..
        } = request;

        match route {
            Route::Predefined { answer } => Ok(Reply::Text(answer)),
            Route::ImageQa { image } => {
                let result = self
                    .capabilities
                    .image_qa
                    .answer(ImageQuestion {
                        image,
                        question: message,
                    })
                    .await?;
                Ok(Reply::Text(result.answer))
            }
            Route::CodeGeneration => {
                let result = self
                    .capabilities
                    .code_generation
                    .generate(CodeQuestion { question: message })
                    .await?;
                Ok(Reply::Code {
                    code: result.code_snippet,
                    language: result.language,
                })
            }
            Route::RealtimeSearch => {
                let result = self
                    .capabilities
                    .realtime_search
                    .search(SearchQuery { query: message })
                    .await?;
                Ok(Reply::Text(result.search_results))
            }
            Route::GeneralChat => {
                let result = self
                    .capabilities
                    .general_chat
                    .answer(ChatQuestion {
                        history,
                        question: message,
                    })
                    .await?;
                Ok(Reply::Text(result.answer))
            }
        }
    }
}

/// Moderation running on its own task. Dropping it aborts the task, so a
/// cancelled dispatch does not leave a provider call running.
struct ModerationTask(JoinHandle<bool>);

impl Drop for ModerationTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Start the moderation check on its own task. Errors never leave the task:
/// they are logged and replaced with `true`.
fn spawn_moderation(check: Arc<dyn ModerationCheck>, text: String) -> ModerationTask {
    ModerationTask(tokio::spawn(async move {
        match check.classify(ModerationInput { text }).await {
            Ok(verdict) => verdict.is_appropriate,
            Err(e) => {
                warn!(error = %e, "Moderation check failed, assuming appropriate");
                true
            }
        }
    }))
}

async fn join_moderation(mut task: ModerationTask) -> bool {
    match (&mut task.0).await {
        Ok(is_appropriate) => is_appropriate,
        Err(e) => {
            warn!(error = %e, "Moderation task did not complete, assuming appropriate");
            true
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
