use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// NATS configuration
#[derive(Clone, Debug, Deserialize)]
pub struct NatsConfig {
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "nats://localhost:4222".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

/// Connect to the NATS broker (core pub/sub, no JetStream).
///
/// The client keeps retrying in the background if the broker is not up yet,
/// and reconnects on its own after a drop.
pub async fn connect(config: &NatsConfig) -> Result<async_nats::Client> {
    info!("Connecting to NATS at {}", config.url);

    let client = async_nats::ConnectOptions::new()
        .retry_on_initial_connect()
        .connect(&config.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.url))?;

    info!("Connected to NATS");
    Ok(client)
}
