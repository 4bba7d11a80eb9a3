//! services/api/src/adapters/memory.rs
//!
//! In-memory implementation of the persistence ports. Backs the test suite
//! and local experimentation; the behavior mirrors the Postgres adapter,
//! with search reduced to case-insensitive substring matching.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_core::domain::{AuthSession, Credential, Document, User};
use docvault_core::ports::{AuthStore, DocumentStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    credentials: HashMap<String, Credential>,
    sessions: HashMap<String, AuthSession>,
    // Insertion order preserved for unqueried listings.
    documents: Vec<Document>,
}

/// A process-local store implementing both persistence ports.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn searchable_text(doc: &Document) -> String {
    let mut text = format!(
        "{} {} {} {}",
        doc.fieldname, doc.originalname, doc.encoding, doc.mimetype
    );
    for kw in &doc.keywords {
        text.push(' ');
        text.push_str(kw);
    }
    text.to_lowercase()
}

//=========================================================================================
// `AuthStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for MemoryStore {
    async fn create_user(&self, user: User, credential: Credential) -> PortResult<User> {
        let mut tables = self.inner.write().await;
        if tables.credentials.contains_key(&credential.id) {
            return Err(PortError::DuplicateIdentity(credential.id));
        }
        tables.users.insert(user.id, user.clone());
        tables.credentials.insert(credential.id.clone(), credential);
        Ok(user)
    }

    async fn find_credential(&self, credential_id: &str) -> PortResult<Credential> {
        let tables = self.inner.read().await;
        tables
            .credentials
            .get(credential_id)
            .cloned()
            .ok_or(PortError::InvalidKey)
    }

    async fn create_session(&self, session: AuthSession) -> PortResult<AuthSession> {
        let mut tables = self.inner.write().await;
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> PortResult<AuthSession> {
        let tables = self.inner.read().await;
        tables
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(PortError::InvalidSession)
    }

    async fn update_session_expiry(&self, session: &AuthSession) -> PortResult<()> {
        let mut tables = self.inner.write().await;
        if let Some(stored) = tables.sessions.get_mut(&session.id) {
            stored.active_expires = session.active_expires;
            stored.idle_expires = session.idle_expires;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        let mut tables = self.inner.write().await;
        tables.sessions.remove(session_id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let mut tables = self.inner.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.idle_expires > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, document: Document) -> PortResult<Document> {
        let mut tables = self.inner.write().await;
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn list_by_owner(&self, user_id: Uuid, query: Option<&str>) -> PortResult<Vec<Document>> {
        let tables = self.inner.read().await;
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let docs = tables
            .documents
            .iter()
            .filter(|d| d.user_id == user_id && !d.trashed)
            .filter(|d| match &query {
                None => true,
                Some(q) => searchable_text(d).contains(q.as_str()),
            })
            .cloned()
            .collect();
        Ok(docs)
    }

    async fn find_by_hash(&self, user_id: Uuid, hash: &str) -> PortResult<Option<Document>> {
        let tables = self.inner.read().await;
        Ok(tables
            .documents
            .iter()
            .find(|d| d.user_id == user_id && d.hash == hash && !d.trashed)
            .cloned())
    }

    async fn soft_delete(
        &self,
        user_id: Uuid,
        hash: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Document> {
        let mut tables = self.inner.write().await;
        let doc = tables
            .documents
            .iter_mut()
            .find(|d| d.user_id == user_id && d.hash == hash && !d.trashed)
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", hash)))?;
        doc.trashed = true;
        doc.trashed_at = Some(now);
        Ok(doc.clone())
    }

    async fn update_keywords(&self, document_id: Uuid, keywords: &[String]) -> PortResult<Document> {
        let mut tables = self.inner.write().await;
        let doc = tables
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))?;
        doc.keywords = keywords.to_vec();
        Ok(doc.clone())
    }
}
