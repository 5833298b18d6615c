//! OECS gateway
//!
//! HTTP service that gates model inference behind an explicit consent
//! handshake, a signed session credential, and a per-category risk budget.

mod api;
mod config;
mod credential;
mod db;
mod filter;
mod history;
mod interrupt;
mod ledger;
mod llm;
mod runtime;
mod session;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState};
use config::GatewayConfig;
use credential::CredentialIssuer;
use db::Database;
use llm::InferenceBackend;
use runtime::{DatabaseStorage, Governor};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oecs_gateway=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = GatewayConfig::from_env();

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let backend = InferenceBackend::from_config(&config.llm);
    if backend.is_configured() {
        tracing::info!(model = %backend.model_id(), "Inference client initialized");
    } else {
        tracing::warn!("GEMINI_API_KEY not set. Active sessions will receive backend errors.");
    }

    let issuer = CredentialIssuer::new(&config.signing_key())?;
    let governor = Governor::new(
        DatabaseStorage::new(db),
        backend,
        issuer,
        config.governor_config(),
    )
    .with_filter(config.hard_stop_filter());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(governor))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("OECS gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
