// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Assistant
//!
//! Search, question answering and summaries over a principal's notes,
//! computed by the private LLM. The notes are passed in by the caller; this
//! module never touches storage.

pub mod client;
pub mod prompts;

use std::sync::Arc;

use tracing::info;

use crate::notes::Note;

pub use client::{
    ChatMessage, CompletionClient, CompletionRequest, CompletionResponse, NilaiClient, Role,
};

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM response was invalid: {0}")]
    InvalidResponse(String),
}

pub struct Assistant {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl Assistant {
    pub fn new(client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn run(&self, request: CompletionRequest, fallback: &str) -> Result<String, AssistantError> {
        let response = self.client.complete(request).await?;
        Ok(response
            .first_content()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()))
    }

    pub async fn search(&self, query: &str, notes: &[Note]) -> Result<String, AssistantError> {
        info!(notes = notes.len(), "Searching notes");
        self.run(prompts::search(&self.model, query, notes), prompts::SEARCH_FALLBACK)
            .await
    }

    pub async fn answer(&self, question: &str, notes: &[Note]) -> Result<String, AssistantError> {
        info!(notes = notes.len(), "Answering question");
        self.run(prompts::answer(&self.model, question, notes), prompts::ANSWER_FALLBACK)
            .await
    }

    pub async fn summarize(&self, notes: &[Note]) -> Result<String, AssistantError> {
        info!(notes = notes.len(), "Summarizing notes");
        self.run(prompts::summarize(&self.model, notes), prompts::SUMMARY_FALLBACK)
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and replies with a fixed completion.
    pub(crate) struct ScriptedClient {
        pub reply: Option<String>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        pub(crate) fn replying(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, AssistantError> {
            self.requests.lock().unwrap().push(request);
            let body = match &self.reply {
                Some(text) => serde_json::json!({ "choices": [{ "message": { "content": text } }] }),
                None => serde_json::json!({ "choices": [] }),
            };
            serde_json::from_value(body).map_err(|e| AssistantError::InvalidResponse(e.to_string()))
        }
    }

    fn note(title: &str) -> Note {
        Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: "body".to_string(),
            tags: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn returns_completion_content() {
        let client = Arc::new(ScriptedClient::replying(Some("found it")));
        let assistant = Assistant::new(client.clone(), "model-x");

        let result = assistant.search("q", &[note("A")]).await.unwrap();
        assert_eq!(result, "found it");

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "model-x");
    }

    #[tokio::test]
    async fn empty_completion_uses_fallbacks() {
        let assistant = Assistant::new(Arc::new(ScriptedClient::replying(None)), "m");
        let notes = [note("A")];

        assert_eq!(assistant.search("q", &notes).await.unwrap(), "No results found.");
        assert_eq!(
            assistant.answer("q", &notes).await.unwrap(),
            "Unable to generate answer."
        );
        assert_eq!(
            assistant.summarize(&notes).await.unwrap(),
            "Unable to generate summary."
        );
    }
}
