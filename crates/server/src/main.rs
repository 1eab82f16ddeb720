//! Voice Shop Server Entry Point
//!
//! `voice-shop` serves the API; `voice-shop sync-catalog` copies the catalog
//! into the vector index and exits.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_shop_config::{load_settings, Settings};
use voice_shop_search::{
    BigCommerceCatalog, BigCommerceConfig, CatalogSync, HttpEmbedder, HttpEmbeddingConfig,
    QdrantIndex, VectorStoreConfig,
};
use voice_shop_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("VOICE_SHOP_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    if std::env::args().nth(1).as_deref() == Some("sync-catalog") {
        return sync_catalog(&config).await;
    }

    tracing::info!("Starting Voice Shop Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let mut state = AppState::from_settings(config.clone())?;
    if config.observability.metrics_enabled {
        if let Some(handle) = init_metrics() {
            tracing::info!("Initialized Prometheus metrics at /metrics");
            state = state.with_metrics(handle);
        }
    }

    tracing::info!(
        llm = %state.llm.model_name(),
        catalog = state.orchestrator.has_catalog(),
        vector = state.orchestrator.has_vector(),
        "Initialized application state"
    );

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Copy every catalog product into the vector index
async fn sync_catalog(config: &Settings) -> anyhow::Result<()> {
    let catalog = BigCommerceConfig::from_settings(&config.catalog)
        .context("Catalog credentials are required for sync-catalog")?;
    let catalog = BigCommerceCatalog::new(catalog)?;
    let embedder = HttpEmbedder::new(HttpEmbeddingConfig::from_settings(&config.embedding))?;
    let index = QdrantIndex::new(VectorStoreConfig::from_settings(
        &config.vector,
        &config.embedding,
    ))?;
    index.ensure_collection().await?;

    let report = CatalogSync::new(Arc::new(catalog), Arc::new(embedder), Arc::new(index))
        .run()
        .await?;
    tracing::info!(
        pages = report.pages,
        upserted = report.upserted,
        failed = report.failed,
        "Catalog sync finished"
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("voice_shop={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
