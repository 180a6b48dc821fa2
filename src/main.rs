use anyhow::Context;
use iot_sensor_analytics::{
    config::Config,
    simulator::{ReadingGenerator, ReadingSender},
    state::create_store,
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);

    tracing::info!("Starting IoT sensor simulator v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = iot_sensor_analytics::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.store.backend);
    let store = create_store(&config.store)
        .await
        .context("failed to open the reading store")?;
    store
        .ping()
        .await
        .context("reading store is not reachable")?;

    let mut sender = ReadingSender::new(store, ReadingGenerator::new());
    let summary = sender
        .run(
            Duration::from_secs(config.simulator.interval_secs),
            config.simulator.max_readings,
        )
        .await;

    tracing::info!(
        sent = summary.sent,
        failed = summary.failed,
        "Shutting down gracefully..."
    );
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("iot_sensor_analytics={}", config.observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
