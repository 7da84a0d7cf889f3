use clap::Parser;
use hotfix_viewer::{
    api::{build_router, AppState},
    catalog::Catalog,
    config::{Config, ObservabilityConfig},
    service::HotfixService,
    usage::create_usage_store,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hotfix-viewer", version, about = "Hotfix search service")]
struct Args {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "HFV_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config_result = Config::load(args.config.as_deref());
    let config = match &config_result {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };

    init_tracing(&config.observability);

    if let Err(e) = &config_result {
        tracing::warn!(error = %e, "Failed to load configuration, using defaults");
    }

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = hotfix_viewer::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Initialize usage log backend
    let usage = create_usage_store(&config.usage_log)?;

    // Initialize catalog
    let catalog = Arc::new(Catalog::new());
    let source = Arc::new(config.catalog.record_source());
    let service = Arc::new(HotfixService::new(catalog, source, usage));

    if config.catalog.load_on_startup {
        // Serve anyway on failure: queries report the store as unavailable until a reload succeeds
        if let Err(e) = service.reload().await {
            tracing::error!(
                path = ?config.catalog.source_path,
                error = %e,
                "Initial catalog load failed"
            );
        }
    }

    let app_state = AppState::new(service)
        .with_query_config(config.query.clone())
        .with_server_config(config.server.clone())
        .with_metrics(config.observability.prometheus_enabled);

    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Hotfix API: http://{}/HFLogViewer", http_addr);

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("hotfix_viewer={0},tower_http={0}", observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
