//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use docvault_core::domain::SessionState;
use docvault_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::{AppState, AuthedUser};

/// Middleware that validates the bearer session token on every protected route.
///
/// If valid, inserts the resolved `AuthedUser` into request extensions for
/// handlers to use. An idle session is renewed in place (sliding expiration);
/// an expired one is deleted and the chain never reaches the handler.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(PortError::InvalidSession)?;

    let session = state.auth.get_session(token).await?;

    // Expiry is evaluated against the stored windows at this moment, never
    // cached, so a racing sweep cannot resurrect a dead session.
    let now = Utc::now();
    let session = match session.state_at(now) {
        SessionState::Active => session,
        SessionState::Idle => {
            let renewed = session.renewed(now, &state.config.session_policy());
            state.auth.update_session_expiry(&renewed).await?;
            debug!("Renewed idle session for user {}", renewed.user_id);
            renewed
        }
        SessionState::Expired => {
            state.auth.delete_session(&session.id).await?;
            return Err(PortError::InvalidSession.into());
        }
    };

    req.extensions_mut().insert(AuthedUser {
        user_id: session.user_id,
    });

    Ok(next.run(req).await)
}
