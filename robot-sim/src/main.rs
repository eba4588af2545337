use anyhow::{Context, Result};
use robot_sim::config;
use robot_sim::peer::run_robot;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robot_sim=info".into()),
        )
        .init();

    info!("Robot simulator starting...");

    let config_path =
        std::env::var("ARGUS_SIM_CONFIG").unwrap_or_else(|_| "robot-sim.toml".to_string());
    let mut sim = config::load_or_default(&config_path)?;
    sim.apply_env_overrides();

    info!(
        nats_url = %sim.nats_url,
        backend_url = %sim.backend_url,
        robots = sim.robots.len(),
        interval_ms = sim.publish_interval_ms,
        "Configuration loaded"
    );

    let sim = Arc::new(sim);
    let mut set = JoinSet::new();
    for robot in sim.robots.clone() {
        info!(robot_id = %robot.id, robot_type = %robot.robot_type, "Starting robot");
        set.spawn(run_robot(robot, Arc::clone(&sim)));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    set.shutdown().await;
    info!("Robot simulator stopped");

    Ok(())
}
