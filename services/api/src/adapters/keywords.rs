//! services/api/src/adapters/keywords.rs
//!
//! This module contains the adapter for the external keyword analyzer.
//! It implements the `KeywordAnalysisService` port from the `core` crate on
//! top of the OpenAI assistants API: one thread per document, one run per
//! submission, keywords read back from the run's last assistant message.

use async_openai::{
    config::OpenAIConfig,
    types::assistants::{
        CreateMessageRequestArgs, CreateRunRequestArgs, CreateThreadRequestArgs, MessageContent,
        MessageRole, RunStatus,
    },
    Client,
};
use async_trait::async_trait;
use docvault_core::ports::{
    AnalysisRun, AnalysisStatus, KeywordAnalysisService, PortError, PortResult,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `KeywordAnalysisService` using a preconfigured
/// OpenAI assistant.
#[derive(Clone)]
pub struct OpenAiKeywordAdapter {
    client: Client<OpenAIConfig>,
    assistant_id: String,
}

impl OpenAiKeywordAdapter {
    /// Creates a new `OpenAiKeywordAdapter`.
    pub fn new(client: Client<OpenAIConfig>, assistant_id: String) -> Self {
        Self { client, assistant_id }
    }
}

fn external(e: impl std::fmt::Display) -> PortError {
    PortError::ExternalService(e.to_string())
}

/// Parses the analyzer's text payload as a JSON array of keyword strings.
pub(crate) fn parse_keyword_payload(raw: &str) -> PortResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw.trim())
        .map_err(|e| external(format!("malformed keyword payload: {}", e)))
}

//=========================================================================================
// `KeywordAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeywordAnalysisService for OpenAiKeywordAdapter {
    async fn submit(&self, text: &str) -> PortResult<AnalysisRun> {
        let thread = self
            .client
            .threads()
            .create(CreateThreadRequestArgs::default().build().map_err(external)?)
            .await
            .map_err(external)?;

        // The extracted document text is the only content of the thread.
        let message = CreateMessageRequestArgs::default()
            .role(MessageRole::User)
            .content(text.to_string())
            .build()
            .map_err(external)?;
        self.client
            .threads()
            .messages(&thread.id)
            .create(message)
            .await
            .map_err(external)?;

        let run = self
            .client
            .threads()
            .runs(&thread.id)
            .create(
                CreateRunRequestArgs::default()
                    .assistant_id(&self.assistant_id)
                    .build()
                    .map_err(external)?,
            )
            .await
            .map_err(external)?;

        Ok(AnalysisRun {
            session_id: thread.id,
            run_id: run.id,
        })
    }

    async fn poll(&self, run: &AnalysisRun) -> PortResult<AnalysisStatus> {
        let status = self
            .client
            .threads()
            .runs(&run.session_id)
            .retrieve(&run.run_id)
            .await
            .map_err(external)?;

        Ok(match status.status {
            RunStatus::Completed => AnalysisStatus::Completed,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                let detail = status
                    .last_error
                    .map(|e| e.message)
                    .unwrap_or_else(|| format!("run ended as {:?}", status.status));
                AnalysisStatus::Failed(detail)
            }
            _ => AnalysisStatus::InProgress,
        })
    }

    async fn fetch_keywords(&self, run: &AnalysisRun) -> PortResult<Vec<String>> {
        let messages = self
            .client
            .threads()
            .messages(&run.session_id)
            .list()
            .await
            .map_err(external)?;

        // The last assistant message belonging to this run carries the result.
        let reply = messages
            .data
            .iter()
            .filter(|m| {
                m.role == MessageRole::Assistant && m.run_id.as_deref() == Some(run.run_id.as_str())
            })
            .last();

        let Some(reply) = reply else {
            // No reply is an empty result, not a failure.
            return Ok(Vec::new());
        };

        let payload = reply.content.iter().find_map(|c| match c {
            MessageContent::Text(text) => Some(text.text.value.clone()),
            _ => None,
        });

        match payload {
            Some(raw) => parse_keyword_payload(&raw),
            None => Ok(Vec::new()),
        }
    }
}
