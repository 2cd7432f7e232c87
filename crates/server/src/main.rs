use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omr_gateway_core::{
    load_config, validate_config, CheckService, CommandEngine, OmrEngine, SecureFileServer,
};
use omr_gateway_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("OMR_GATEWAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Templates directory: {:?}", config.paths.templates_dir);
    info!("Workspace root: {:?}", config.paths.workspace_root());
    info!(
        "Upload ceiling: {} bytes (chunk size {})",
        config.upload.max_bytes, config.upload.chunk_size
    );

    let checked_dir = config.paths.checked_omr_dir();
    tokio::fs::create_dir_all(&checked_dir)
        .await
        .with_context(|| format!("Failed to create artifact directory {:?}", checked_dir))?;

    let engine: Arc<dyn OmrEngine> = Arc::new(CommandEngine::new(config.engine.clone()));
    let check_service = CheckService::new(&config, engine);
    info!(
        "Using OMR engine: {} ({})",
        check_service.engine_name(),
        config.engine.program.display()
    );
    let file_server = SecureFileServer::new(&checked_dir);
    let state = Arc::new(AppState::new(check_service, file_server));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
