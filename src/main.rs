use anyhow::{Context, Result};
use pushsource::config::{load_config, PushSourceConfig};
use pushsource::{BroadcastSink, DataSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pushsource=info".into()),
        )
        .init();

    info!("pushsource starting...");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PUSHSOURCE_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pushsource.toml"));

    let config = if config_path.exists() {
        load_config(&config_path)?
    } else {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
        PushSourceConfig::default()
    };

    let sink = Arc::new(BroadcastSink::new(config.events.channel_capacity));
    let mut rx = sink.subscribe();

    // Log every registry change; stands in for a real consumer
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(n) => info!(
                    uid = n.streamer.uid,
                    targets = n.streamer.targets.len(),
                    needs_connection = n.streamer.needs_connection(),
                    topic = n.topic,
                    "{}",
                    n.kind
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged behind registry");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut data_source = DataSource::from_config(&config.source, sink);
    let report = data_source
        .load()
        .await
        .context("Failed to load data source")?;

    info!(
        streamers = data_source.registry().len(),
        watching = data_source.is_watching(),
        "Data source ready: {}",
        report.summary()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    data_source.shutdown().await;

    Ok(())
}
