//! crates/docvault_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

//=========================================================================================
// Content Addressing and Upload Gating
//=========================================================================================

/// The exact MIME type strings accepted for upload.
pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// Returns true if the declared MIME type is on the upload allow-list.
///
/// The declared type is trusted client input; magic-byte sniffing is a known
/// gap and is intentionally not performed here.
pub fn mime_allowed(mimetype: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mimetype)
}

/// Computes the hex-encoded SHA-256 digest of raw content bytes.
///
/// Pure function of the bytes: identical content always produces an identical
/// hash, regardless of filename or any other metadata.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

//=========================================================================================
// Identity
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct Credential {
    /// Provider-scoped identifier, e.g. "email:alice@example.com". Globally unique.
    pub id: String,
    pub user_id: Uuid,
    pub hashed_password: String,
}

/// Builds the provider-scoped credential identifier.
pub fn credential_id(provider_id: &str, provider_user_id: &str) -> String {
    format!("{}:{}", provider_id, provider_user_id)
}

//=========================================================================================
// Sessions
//=========================================================================================

// Represents a bearer-token login session
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Opaque 40-character token handed to the client.
    pub id: String,
    pub user_id: Uuid,
    pub active_expires: DateTime<Utc>,
    pub idle_expires: DateTime<Utc>,
}

/// Where a session sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Usable as-is.
    Active,
    /// Past the active window but renewable (sliding expiration).
    Idle,
    /// Past both windows; must be rejected and deleted.
    Expired,
}

/// The configured durations of the two expiry windows.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub active_period: Duration,
    pub idle_period: Duration,
}

impl SessionPolicy {
    /// Computes the (active_expires, idle_expires) pair for a session
    /// created or renewed at `now`.
    pub fn windows(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let active_expires = now + self.active_period;
        let idle_expires = active_expires + self.idle_period;
        (active_expires, idle_expires)
    }
}

impl AuthSession {
    /// Classifies the session at `now`. Deterministic: a session is Active
    /// strictly before `active_expires`, so at the exact boundary instant it
    /// has already slipped into Idle.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if now < self.active_expires {
            SessionState::Active
        } else if now < self.idle_expires {
            SessionState::Idle
        } else {
            SessionState::Expired
        }
    }

    /// Returns a copy with both windows reset from `now`. Only meaningful for
    /// a session in the Idle state; callers persist the result.
    pub fn renewed(&self, now: DateTime<Utc>, policy: &SessionPolicy) -> AuthSession {
        let (active_expires, idle_expires) = policy.windows(now);
        AuthSession {
            id: self.id.clone(),
            user_id: self.user_id,
            active_expires,
            idle_expires,
        }
    }
}

//=========================================================================================
// Documents
//=========================================================================================

/// A stored document owned by exactly one user.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Multipart field name the file arrived under.
    pub fieldname: String,
    pub originalname: String,
    pub encoding: String,
    pub mimetype: String,
    pub date: DateTime<Utc>,
    pub content: Vec<u8>,
    /// Hex SHA-256 of `content`.
    pub hash: String,
    pub keywords: Vec<String>,
    pub trashed: bool,
    pub trashed_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Builds a freshly uploaded document: hash computed from the bytes,
    /// keywords empty until enrichment completes, not trashed.
    pub fn new(
        user_id: Uuid,
        fieldname: String,
        originalname: String,
        encoding: String,
        mimetype: String,
        content: Vec<u8>,
    ) -> Self {
        let hash = hash_bytes(&content);
        Document {
            id: Uuid::new_v4(),
            user_id,
            fieldname,
            originalname,
            encoding,
            mimetype,
            date: Utc::now(),
            content,
            hash,
            keywords: Vec::new(),
            trashed: false,
            trashed_at: None,
        }
    }
}
