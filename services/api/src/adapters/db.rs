//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `AuthStore` and `DocumentStore` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_core::domain::{AuthSession, Credential, Document, User};
use docvault_core::ports::{AuthStore, DocumentStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// The tsvector expression backing the documents_fts_idx index. Must stay in
// sync with the migration.
const DOCUMENT_TSVECTOR: &str = "to_tsvector('simple', fieldname || ' ' || originalname || ' ' \
     || encoding || ' ' || mimetype || ' ' || array_to_string(keywords, ' '))";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn persistence(e: sqlx::Error) -> PortError {
    PortError::Persistence(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialRecord {
    id: String,
    user_id: Uuid,
    hashed_password: String,
}
impl CredentialRecord {
    fn to_domain(self) -> Credential {
        Credential {
            id: self.id,
            user_id: self.user_id,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    user_id: Uuid,
    active_expires: DateTime<Utc>,
    idle_expires: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            active_expires: self.active_expires,
            idle_expires: self.idle_expires,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: Uuid,
    fieldname: String,
    originalname: String,
    encoding: String,
    mimetype: String,
    date: DateTime<Utc>,
    content: Vec<u8>,
    hash: String,
    keywords: Vec<String>,
    trashed: bool,
    trashed_at: Option<DateTime<Utc>>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            user_id: self.user_id,
            fieldname: self.fieldname,
            originalname: self.originalname,
            encoding: self.encoding,
            mimetype: self.mimetype,
            date: self.date,
            content: self.content,
            hash: self.hash,
            keywords: self.keywords,
            trashed: self.trashed,
            trashed_at: self.trashed_at,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, user_id, fieldname, originalname, encoding, mimetype, date, \
     content, hash, keywords, trashed, trashed_at";

//=========================================================================================
// `AuthStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthStore for DbAdapter {
    async fn create_user(&self, user: User, credential: Credential) -> PortResult<User> {
        // User and credential land in one transaction so a duplicate identity
        // cannot leave an orphaned row of either kind behind.
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query("INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.username)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::DuplicateIdentity(credential.id.clone())
                } else {
                    persistence(e)
                }
            })?;

        sqlx::query("INSERT INTO credentials (id, user_id, hashed_password) VALUES ($1, $2, $3)")
            .bind(&credential.id)
            .bind(credential.user_id)
            .bind(&credential.hashed_password)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::DuplicateIdentity(credential.id.clone())
                } else {
                    persistence(e)
                }
            })?;

        tx.commit().await.map_err(persistence)?;
        Ok(user)
    }

    async fn find_credential(&self, credential_id: &str) -> PortResult<Credential> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            "SELECT id, user_id, hashed_password FROM credentials WHERE id = $1",
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        record.map(|r| r.to_domain()).ok_or(PortError::InvalidKey)
    }

    async fn create_session(&self, session: AuthSession) -> PortResult<AuthSession> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, active_expires, idle_expires) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.active_expires)
        .bind(session.idle_expires)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> PortResult<AuthSession> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, active_expires, idle_expires FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        record.map(|r| r.to_domain()).ok_or(PortError::InvalidSession)
    }

    async fn update_session_expiry(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query("UPDATE sessions SET active_expires = $1, idle_expires = $2 WHERE id = $3")
            .bind(session.active_expires)
            .bind(session.idle_expires)
            .bind(&session.id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE idle_expires <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(result.rows_affected())
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn create_document(&self, document: Document) -> PortResult<Document> {
        sqlx::query(
            "INSERT INTO documents (id, user_id, fieldname, originalname, encoding, mimetype, \
             date, content, hash, keywords, trashed, trashed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(&document.fieldname)
        .bind(&document.originalname)
        .bind(&document.encoding)
        .bind(&document.mimetype)
        .bind(document.date)
        .bind(&document.content)
        .bind(&document.hash)
        .bind(&document.keywords)
        .bind(document.trashed)
        .bind(document.trashed_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(document)
    }

    async fn list_by_owner(&self, user_id: Uuid, query: Option<&str>) -> PortResult<Vec<Document>> {
        let records = match query.filter(|q| !q.trim().is_empty()) {
            None => {
                let sql = format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents \
                     WHERE user_id = $1 AND trashed = FALSE ORDER BY date ASC"
                );
                sqlx::query_as::<_, DocumentRecord>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(persistence)?
            }
            Some(q) => {
                // Relevance order comes from the persistence engine itself.
                let sql = format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents \
                     WHERE user_id = $1 AND trashed = FALSE \
                     AND {DOCUMENT_TSVECTOR} @@ plainto_tsquery('simple', $2) \
                     ORDER BY ts_rank({DOCUMENT_TSVECTOR}, plainto_tsquery('simple', $2)) DESC"
                );
                sqlx::query_as::<_, DocumentRecord>(&sql)
                    .bind(user_id)
                    .bind(q)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(persistence)?
            }
        };

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_by_hash(&self, user_id: Uuid, hash: &str) -> PortResult<Option<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE user_id = $1 AND hash = $2 AND trashed = FALSE LIMIT 1"
        );
        let record = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(user_id)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn soft_delete(
        &self,
        user_id: Uuid,
        hash: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Document> {
        let sql = format!(
            "UPDATE documents SET trashed = TRUE, trashed_at = $3 \
             WHERE user_id = $1 AND hash = $2 AND trashed = FALSE \
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(user_id)
            .bind(hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?;

        record
            .map(|r| r.to_domain())
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", hash)))
    }

    async fn update_keywords(&self, document_id: Uuid, keywords: &[String]) -> PortResult<Document> {
        // Overwrite, not append: re-running enrichment replaces the field.
        // Trashed documents are updated too.
        let sql = format!(
            "UPDATE documents SET keywords = $2 WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, DocumentRecord>(&sql)
            .bind(document_id)
            .bind(keywords)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?;

        record
            .map(|r| r.to_domain())
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))
    }
}
