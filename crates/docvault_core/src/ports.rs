//! crates/docvault_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuthSession, Credential, Document, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// while keeping the failure kinds the web layer needs to distinguish.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    #[error("Identity already registered: {0}")]
    DuplicateIdentity(String),
    #[error("AUTH_INVALID_KEY_ID")]
    InvalidKey,
    #[error("AUTH_INVALID_PASSWORD")]
    InvalidPassword,
    #[error("Invalid session")]
    InvalidSession,
    #[error("{0}")]
    Validation(String),
    #[error("External service failure: {0}")]
    ExternalService(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

/// Owns users, credentials and login sessions.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Persists a new user together with its credential. Atomic from the
    /// caller's perspective: a failure must leave neither record behind.
    /// Fails with `DuplicateIdentity` when the credential id is taken.
    async fn create_user(&self, user: User, credential: Credential) -> PortResult<User>;

    /// Looks up a credential by its provider-scoped identifier.
    /// Fails with `InvalidKey` when no such identity exists.
    async fn find_credential(&self, credential_id: &str) -> PortResult<Credential>;

    async fn create_session(&self, session: AuthSession) -> PortResult<AuthSession>;

    /// Fetches a session by token. Fails with `InvalidSession` when absent.
    async fn get_session(&self, session_id: &str) -> PortResult<AuthSession>;

    /// Overwrites the expiry windows of an existing session (sliding renewal).
    async fn update_session_expiry(&self, session: &AuthSession) -> PortResult<()>;

    async fn delete_session(&self, session_id: &str) -> PortResult<()>;

    /// Removes every session whose idle window has elapsed at `now`.
    /// Returns the number of sessions swept.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> PortResult<u64>;
}

/// Owns document records. Every operation is scoped to the owning user and
/// excludes trashed documents unless stated otherwise.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, document: Document) -> PortResult<Document>;

    /// Lists the owner's non-trashed documents. With a query, performs a
    /// case-insensitive full-text search across filename, fieldname,
    /// encoding, MIME type and keywords, in the engine's relevance order.
    async fn list_by_owner(&self, user_id: Uuid, query: Option<&str>) -> PortResult<Vec<Document>>;

    async fn find_by_hash(&self, user_id: Uuid, hash: &str) -> PortResult<Option<Document>>;

    /// Marks the document trashed and stamps `trashed_at`. The record is never
    /// physically removed. Fails with `NotFound` when no non-trashed document
    /// with that hash exists for the user.
    async fn soft_delete(&self, user_id: Uuid, hash: &str, now: DateTime<Utc>) -> PortResult<Document>;

    /// Idempotent overwrite of the keywords field. Writes into trashed
    /// documents too; trashing is independent of enrichment.
    async fn update_keywords(&self, document_id: Uuid, keywords: &[String]) -> PortResult<Document>;
}

//=========================================================================================
// Enrichment Ports
//=========================================================================================

/// Handle for one unit of analysis work at the external provider.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// The provider-side conversation/session the text was submitted to.
    pub session_id: String,
    /// The unit of work started against the configured analyzer.
    pub run_id: String,
}

/// Status reported by the provider while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    InProgress,
    Completed,
    Failed(String),
}

/// Extracts plain text from uploaded bytes according to their MIME type.
/// Image types yield an empty string; that is valid input for analysis.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, content: &[u8], mimetype: &str) -> PortResult<String>;
}

/// The contract the enrichment pipeline requires from an AI analysis provider.
#[async_trait]
pub trait KeywordAnalysisService: Send + Sync {
    /// Opens an analysis session, submits `text` as its only content and
    /// starts a run against the preconfigured analyzer identity.
    async fn submit(&self, text: &str) -> PortResult<AnalysisRun>;

    /// Reports the current status of a run.
    async fn poll(&self, run: &AnalysisRun) -> PortResult<AnalysisStatus>;

    /// Fetches the keywords produced by a completed run: the last message
    /// authored by the analyzer for that run, parsed as a list of strings.
    /// No matching message yields an empty list, not a failure.
    async fn fetch_keywords(&self, run: &AnalysisRun) -> PortResult<Vec<String>>;
}
