//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use docvault_core::ports::{AuthStore, DocumentStore, KeywordAnalysisService, TextExtractor};
use std::sync::Arc;
use uuid::Uuid;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub analyzer: Arc<dyn KeywordAnalysisService>,
    pub config: Arc<Config>,
}

/// The identity the auth middleware resolves for a request and inserts into
/// request extensions for handlers to read.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: Uuid,
}
