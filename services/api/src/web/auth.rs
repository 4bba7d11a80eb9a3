//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for account registration and login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use docvault_core::domain::{self, AuthSession, Credential, User};
use docvault_core::ports::PortError;
use rand::RngCore;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// Request Types and Validation
//=========================================================================================

#[derive(Deserialize)]
pub struct AccountRequest {
    pub email: String,
    pub password: String,
}

impl AccountRequest {
    /// Mirrors the registration schema: a plausible email address and a
    /// password between 6 and 32 characters.
    fn validate(&self) -> Result<(), PortError> {
        let (local, domain_part) = self
            .email
            .split_once('@')
            .ok_or_else(|| PortError::Validation("Invalid email".to_string()))?;
        if local.is_empty() || domain_part.is_empty() || !domain_part.contains('.') {
            return Err(PortError::Validation("Invalid email".to_string()));
        }
        let len = self.password.chars().count();
        if !(6..=32).contains(&len) {
            return Err(PortError::Validation(
                "Password must be between 6 and 32 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates the opaque 40-character session token (20 random bytes, hex).
fn generate_session_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new account with an email credential.
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    let user = User {
        id: Uuid::new_v4(),
        username: req.email.clone(),
        created_at: Utc::now(),
    };
    let credential = Credential {
        id: domain::credential_id("email", &req.email),
        user_id: user.id,
        hashed_password: password_hash,
    };

    // User and credential are persisted atomically; a duplicate identity
    // leaves nothing behind.
    let user = state.auth.create_user(user, credential).await?;
    info!("Registered user {}", user.id);

    Ok(Json(json!({"message": "Account created!", "success": true})))
}

/// POST /login - Verify a credential and issue a session token.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    // Unknown identity and wrong password stay distinct error kinds; the
    // response messages differ too, preserving the legacy contract.
    let credential = state
        .auth
        .find_credential(&domain::credential_id("email", &req.email))
        .await?;

    let parsed_hash = PasswordHash::new(&credential.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(PortError::InvalidPassword.into());
    }

    let now = Utc::now();
    let (active_expires, idle_expires) = state.config.session_policy().windows(now);
    let session = AuthSession {
        id: generate_session_token(),
        user_id: credential.user_id,
        active_expires,
        idle_expires,
    };
    let session = state.auth.create_session(session).await?;

    Ok(Json(json!({"session": session.id, "success": true})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_is_40_hex_chars() {
        let token = generate_session_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_tokens_are_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn account_validation() {
        let ok = AccountRequest {
            email: "alice@example.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = AccountRequest {
            email: "not-an-email".into(),
            password: "secret1".into(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = AccountRequest {
            email: "alice@example.com".into(),
            password: "12345".into(),
        };
        assert!(short_password.validate().is_err());

        let long_password = AccountRequest {
            email: "alice@example.com".into(),
            password: "x".repeat(33),
        };
        assert!(long_password.validate().is_err());
    }
}
