//! Crewbill quote service binary

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewbill_engine::{BuiltinSource, FileSource, PricingEngine, PricingSource};
use crewbill_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Crewbill quote service v{}", crewbill_common::VERSION);

    let config = ServerConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let source: Box<dyn PricingSource> = match &config.catalog_path {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(BuiltinSource),
    };
    let engine = PricingEngine::from_source(source.as_ref()).await?;
    info!(
        "Pricing engine ready: {} features, {} tiers, version {:016x}",
        engine.catalog().len(),
        engine.tiers().len(),
        engine.version()
    );

    let state = AppState::new(engine, &config)?;
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Quote API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down Crewbill quote service");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
