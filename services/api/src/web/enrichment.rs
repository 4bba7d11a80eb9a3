//! services/api/src/web/enrichment.rs
//!
//! The asynchronous "worker" task that enriches one document with extracted
//! keywords after its upload response has already been sent. One task runs
//! per in-flight document; failures are logged, never surfaced to the
//! original caller.

use docvault_core::ports::{AnalysisStatus, PortError, PortResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::web::state::AppState;

/// The stages a document moves through while being enriched. `Failed` is
/// terminal; the document keeps whatever keywords it had before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentPhase {
    Pending,
    TextExtracted,
    AnalysisSubmitted,
    Polling,
    Completed,
    Failed,
}

/// Entry point spawned by the upload handler. Runs the pipeline to completion
/// and records the outcome in the logs.
pub async fn enrich_document(
    app_state: Arc<AppState>,
    document_id: Uuid,
    content: Vec<u8>,
    mimetype: String,
) {
    info!(%document_id, phase = ?EnrichmentPhase::Pending, "Enrichment started");
    match run_pipeline(&app_state, document_id, &content, &mimetype).await {
        Ok(keywords) => {
            info!(
                %document_id,
                phase = ?EnrichmentPhase::Completed,
                "Enrichment finished with {} keywords",
                keywords.len()
            );
        }
        Err(e) => {
            error!(%document_id, phase = ?EnrichmentPhase::Failed, "Enrichment failed: {}", e);
        }
    }
}

async fn run_pipeline(
    app_state: &AppState,
    document_id: Uuid,
    content: &[u8],
    mimetype: &str,
) -> PortResult<Vec<String>> {
    // Image uploads produce empty text and still go through analysis.
    let text = app_state.extractor.extract_text(content, mimetype).await?;
    debug!(
        %document_id,
        phase = ?EnrichmentPhase::TextExtracted,
        "Extracted {} characters",
        text.len()
    );

    let run = app_state.analyzer.submit(&text).await?;
    debug!(
        %document_id,
        phase = ?EnrichmentPhase::AnalysisSubmitted,
        run_id = %run.run_id,
        "Analysis run started"
    );

    // Bounded polling: a fixed interval with an attempt ceiling, so a stuck
    // run cannot pin this task forever.
    let interval = Duration::from_millis(app_state.config.poll_interval_ms);
    let max_attempts = app_state.config.max_poll_attempts;
    let mut completed = false;
    for attempt in 1..=max_attempts {
        match app_state.analyzer.poll(&run).await? {
            AnalysisStatus::Completed => {
                completed = true;
                break;
            }
            AnalysisStatus::Failed(detail) => {
                return Err(PortError::ExternalService(detail));
            }
            AnalysisStatus::InProgress => {
                debug!(
                    %document_id,
                    phase = ?EnrichmentPhase::Polling,
                    attempt,
                    "Run still in progress"
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
    if !completed {
        return Err(PortError::ExternalService(format!(
            "analysis did not complete within {} polls",
            max_attempts
        )));
    }

    let keywords = app_state.analyzer.fetch_keywords(&run).await?;

    // Written even if the document was trashed mid-flight; trashing is
    // independent of enrichment.
    app_state
        .documents
        .update_keywords(document_id, &keywords)
        .await?;
    Ok(keywords)
}
