//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{load_catalog, LogNotificationAdapter},
    config::Config,
    error::ApiError,
    web::{build_app, scheduler::sweep_loop, state::AppState},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutoring_core::{TutorCatalog, WorkflowEngine};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Load the Tutor Catalog ---
    let catalog = match &config.catalog_path {
        Some(path) => {
            info!("Loading tutor catalog from {}", path.display());
            load_catalog(path).await?
        }
        None => {
            info!("CATALOG_PATH not set, using the built-in tutor catalog.");
            TutorCatalog::builtin()
        }
    };
    info!(tutors = catalog.entries().len(), "Tutor catalog ready.");

    // --- 3. Build the Shared AppState ---
    let engine = WorkflowEngine::with_system_clock(catalog);
    let notifier = Arc::new(LogNotificationAdapter::new());
    let app_state = Arc::new(AppState::new(engine, config.clone(), notifier));

    // --- 4. Start the Sweep Scheduler ---
    let cancellation_token = CancellationToken::new();
    let scheduler = tokio::spawn(sweep_loop(
        app_state.clone(),
        config.sweep_interval,
        cancellation_token.clone(),
    ));

    // --- 5. Create the Web Router ---
    let app = build_app(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let shutdown_token = cancellation_token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
            shutdown_token.cancel();
        })
        .await?;

    cancellation_token.cancel();
    if let Err(e) = scheduler.await {
        tracing::error!("Sweep scheduler task failed: {}", e);
    }
    Ok(())
}
