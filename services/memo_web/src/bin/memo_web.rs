//! services/memo_web/src/bin/memo_web.rs

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::{routing::get, Router};
use memo_share_core::ports::{DocumentStore, IdentityProvider};
use memo_web_lib::{
    adapters::{FixtureIdentityProvider, InMemoryDocumentStore},
    config::Config,
    error::AppError,
    web::{health_handler, rest::ApiDoc, state::AppState, ws_handler},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Adapters ---
    let accounts_json = tokio::fs::read_to_string(&config.identity_accounts_path).await?;
    let identity = FixtureIdentityProvider::from_json(&accounts_json)?;
    info!(
        "Loaded {} identity accounts from {}",
        identity.len(),
        config.identity_accounts_path.display()
    );
    let identity: Arc<dyn IdentityProvider> = Arc::new(identity);
    let store: Arc<dyn DocumentStore> =
        Arc::new(InMemoryDocumentStore::new(config.snapshot_channel_capacity));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState { store, identity });

    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        AppError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
