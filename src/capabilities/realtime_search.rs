//! Real-time information retrieval: look the query up, then summarize.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    RealtimeSearch, SearchQuery, SearchResults, SearchTool, ToolResults, complete_text,
};
use crate::error::CapabilityError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const CAPABILITY: &str = "realtime_search";
const TOOL: &str = "search_internet";

const SUMMARY_PROMPT: &str = "You are an AI assistant that retrieves real-time information from the \
internet based on the user's query.\n\n\
Summarize the information in the search results and present it to the user. Do not just repeat \
the search results. If the search results are empty, say that you couldn't find any information.";

/// Search tool that asks the model to search the web for the query.
pub struct LlmSearchTool {
    llm: Arc<dyn LlmProvider>,
}

impl LlmSearchTool {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SearchTool for LlmSearchTool {
    async fn lookup(&self, input: SearchQuery) -> Result<ToolResults, CapabilityError> {
        info!(query = %input.query, "Searching internet");
        let request = CompletionRequest::new(vec![ChatMessage::user(format!(
            "Search the internet for: {}",
            input.query
        ))])
        .with_max_tokens(1024);

        let results = complete_text(self.llm.as_ref(), TOOL, request)
            .await
            .map_err(|e| CapabilityError::SearchTool(e.to_string()))?;
        Ok(ToolResults { results })
    }
}

/// Real-time search backed by a [`SearchTool`] and a summarizing model call.
pub struct LlmRealtimeSearch {
    llm: Arc<dyn LlmProvider>,
    tool: Arc<dyn SearchTool>,
}

impl LlmRealtimeSearch {
    pub fn new(llm: Arc<dyn LlmProvider>, tool: Arc<dyn SearchTool>) -> Self {
        Self { llm, tool }
    }
}

#[async_trait]
impl RealtimeSearch for LlmRealtimeSearch {
    async fn search(&self, input: SearchQuery) -> Result<SearchResults, CapabilityError> {
        let found = self
            .tool
            .lookup(SearchQuery {
                query: input.query.clone(),
            })
            .await?;
        debug!(bytes = found.results.len(), "Search tool returned");

        let results = if found.results.trim().is_empty() {
            "(no results)"
        } else {
            found.results.as_str()
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::user(format!(
                "Query: {}\n\nSearch results:\n{}",
                input.query, results
            )),
        ])
        .with_temperature(0.3)
        .with_max_tokens(1024);

        let summary = complete_text(self.llm.as_ref(), CAPABILITY, request).await?;
        Ok(SearchResults {
            search_results: summary.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::ScriptedLlm;

    struct FixedTool(&'static str);

    #[async_trait]
    impl SearchTool for FixedTool {
        async fn lookup(&self, _input: SearchQuery) -> Result<ToolResults, CapabilityError> {
            Ok(ToolResults {
                results: self.0.to_string(),
            })
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl SearchTool for BrokenTool {
        async fn lookup(&self, _input: SearchQuery) -> Result<ToolResults, CapabilityError> {
            Err(CapabilityError::SearchTool("offline".into()))
        }
    }

    #[tokio::test]
    async fn summarizes_tool_results() {
        let llm = Arc::new(ScriptedLlm::reply("Team A leads 2-1."));
        let search = LlmRealtimeSearch::new(llm.clone(), Arc::new(FixedTool("A 2, B 1 (75')")));

        let results = search
            .search(SearchQuery {
                query: "who is winning the match".into(),
            })
            .await
            .unwrap();
        assert_eq!(results.search_results, "Team A leads 2-1.");

        let prompt = &llm.request(0).messages[1].content;
        assert!(prompt.contains("who is winning the match"));
        assert!(prompt.contains("A 2, B 1 (75')"));
    }

    #[tokio::test]
    async fn empty_results_are_marked() {
        let llm = Arc::new(ScriptedLlm::reply("I couldn't find any information."));
        let search = LlmRealtimeSearch::new(llm.clone(), Arc::new(FixedTool("   ")));
        search
            .search(SearchQuery {
                query: "latest news".into(),
            })
            .await
            .unwrap();
        assert!(llm.request(0).messages[1].content.contains("(no results)"));
    }

    #[tokio::test]
    async fn tool_failure_skips_summary() {
        let llm = Arc::new(ScriptedLlm::reply("unused"));
        let search = LlmRealtimeSearch::new(llm.clone(), Arc::new(BrokenTool));
        let err = search
            .search(SearchQuery {
                query: "stock price".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::SearchTool(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn llm_tool_then_summary_share_provider() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("Sunny, 24C"),
            Ok("Expect sunshine today ☀️"),
        ]));
        let tool = Arc::new(LlmSearchTool::new(llm.clone()));
        let search = LlmRealtimeSearch::new(llm.clone(), tool);

        let results = search
            .search(SearchQuery {
                query: "weather forecast Lisbon".into(),
            })
            .await
            .unwrap();
        assert_eq!(results.search_results, "Expect sunshine today ☀️");
        assert_eq!(llm.call_count(), 2);
        assert_eq!(
            llm.request(0).messages[0].content,
            "Search the internet for: weather forecast Lisbon"
        );
        assert_eq!(llm.request(0).metadata["capability"], "search_internet");
    }
}
