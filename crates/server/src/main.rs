use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cruisefeed_core::{
    load_config, validate_config, AllowListSanitizer, Automation, BrokerSettings,
    CategoryRegistry, ChromiumAutomation, DockerSecrets, FeedAssembler, FeedPipeline,
    PlannerSearcher, SanitizedConfig, SecretProvider, SessionBroker, SessionState,
};
use cruisefeed_server::api::create_router;
use cruisefeed_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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
    let config_path = std::env::var("CRUISEFEED_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    let sanitized = SanitizedConfig::from(&config);
    info!(
        base_url = %sanitized.upstream.base_url,
        item_limit = sanitized.feed.item_limit,
        secrets_dir = ?sanitized.secrets_dir,
        "Upstream configured"
    );

    // Credentials: Docker secrets with environment fallback
    let secrets: Arc<dyn SecretProvider> = Arc::new(DockerSecrets::new(&config.secrets.dir));

    // Browser is launched on first login
    let automation: Arc<dyn Automation> = Arc::new(ChromiumAutomation::new(config.browser.clone()));

    let broker = SessionBroker::new(BrokerSettings::from_config(&config), automation, secrets)
        .context("Failed to start session broker")?;

    let searcher = PlannerSearcher::new(config.upstream.clone(), broker.clone())
        .context("Failed to create catalog client")?;
    info!("Catalog client initialized");

    let assembler = FeedAssembler::new(
        &config.upstream,
        &config.feed,
        Arc::new(AllowListSanitizer::new()),
    );
    let registry = CategoryRegistry::cruise_planner();
    info!(categories = ?registry.codes(), "Category registry loaded");

    let pipeline = FeedPipeline::new(registry, Arc::new(searcher), assembler);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), pipeline, broker.clone()));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Free the booking system's session slot on the way out
    info!("Server shutting down...");
    if matches!(broker.state().await, SessionState::Authenticated { .. }) {
        broker.logout().await;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
