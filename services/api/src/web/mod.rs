pub mod auth;
pub mod documents;
pub mod enrichment;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::web::state::AppState;

// Re-export the auth middleware to make it easily accessible to the binary
// that builds the web server router.
pub use middleware::require_auth;

/// Builds the complete application router: public auth endpoints, protected
/// document endpoints behind the session middleware, CORS and body limits.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/uploadDocument", post(documents::upload_document_handler))
        .route("/getDocuments", get(documents::get_documents_handler))
        .route(
            "/deleteDocument/{hash}",
            delete(documents::delete_document_handler),
        )
        .route(
            "/searchDocument/{search}",
            get(documents::search_document_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(cors)
        .with_state(app_state)
}
