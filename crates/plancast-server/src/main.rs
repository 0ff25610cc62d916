//! Plancast server - WebSocket coordinator for shared estimation sessions.

use anyhow::Result;
use axum::{http::HeaderValue, routing::get, Router};
use clap::Parser;
use plancast_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Plancast server - shared real-time planning poker sessions.
#[derive(Parser, Debug)]
#[command(name = "plancast-server")]
#[command(about = "WebSocket server for shared planning poker sessions")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "hub=debug" or "ws=trace")
    /// Can be specified multiple times. Targets are prefixed with "plancast::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(target: "plancast::startup", "Loaded configuration (port: {})", config.port);

    // Initialize application state
    let state = Arc::new(AppState::new(config.clone()));
    tracing::info!(target: "plancast::startup", "Initialized session hub");

    let cors = if config.allowed_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(config.allowed_origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Build router
    let app = Router::new()
        .route("/api/health", get(routes::health))
        .route("/ws", get(routes::ws::upgrade))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "plancast::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
