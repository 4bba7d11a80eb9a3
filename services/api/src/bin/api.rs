//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, DocumentTextExtractor, OpenAiKeywordAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept out of storage.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let analyzer = Arc::new(OpenAiKeywordAdapter::new(
        openai_client,
        config.assistant_id.clone(),
    ));
    let extractor = Arc::new(DocumentTextExtractor::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        auth: db_adapter.clone(),
        documents: db_adapter.clone(),
        extractor,
        analyzer,
        config: config.clone(),
    });

    // --- 5. Start the Session Expiry Sweep ---
    let sweep_store = app_state.auth.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match sweep_store.delete_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!("Swept {} expired sessions", n),
                Err(e) => error!("Session sweep failed: {}", e),
            }
        }
    });

    // --- 6. Create the Web Router & Start the Server ---
    let app = build_router(app_state);
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
