//! Main Entrypoint for the Interview Relay Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Constructing the shared state (persona catalog, Groq client, Deepgram connector).
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use interview_relay::{
    config::Config,
    persona::PersonaCatalog,
    prompt::GroqPromptSynthesizer,
    router::{SERVICE_NAME, create_router},
    state::AppState,
    ws::deepgram::DeepgramConnector,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // Missing keys are reported per session rather than refusing to boot,
    // but a startup warning saves some head scratching.
    if config.deepgram_key.is_none() {
        warn!("DEEPGRAM_KEY is not set; sessions will fail at setup");
    }
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY is not set; prompt synthesis will fail");
    }

    let synthesizer = GroqPromptSynthesizer::new(
        config.groq_api_key.clone(),
        config.prompt_model.clone(),
    );
    let upstream = DeepgramConnector::new(config.deepgram_key.clone().unwrap_or_default());

    let app_state = Arc::new(AppState {
        config: Arc::new(config.clone()),
        personas: Arc::new(PersonaCatalog::builtin()),
        synthesizer: Arc::new(synthesizer),
        upstream: Arc::new(upstream),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    info!(
        service = SERVICE_NAME,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
