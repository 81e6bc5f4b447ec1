//! receptor - HTTP Server Entry Point
//!
//! Loads configuration from the environment and serves the task API.

use receptor::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "receptor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: store={} path={} timeout={}ms",
        config.store.backend,
        config.store.path.display(),
        config.store.timeout.as_millis()
    );

    info!("Starting server on {}", config.listen_addr());
    api::serve(config).await?;

    Ok(())
}
