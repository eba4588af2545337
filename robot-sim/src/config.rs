use anyhow::{Context, Result};
use argus::robot::RobotType;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One simulated robot
#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    pub id: String,
    pub name: String,
    pub robot_type: RobotType,
    pub start_lat: f64,
    pub start_lon: f64,
    /// Meters; negative is depth for underwater robots
    #[serde(default)]
    pub start_alt: f64,
    #[serde(default)]
    pub start_heading: f64,
    #[serde(default = "default_patrol_radius")]
    pub patrol_radius: f64,
    /// Cruise speed in m/s; `set_speed` may go up to twice this
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

fn default_patrol_radius() -> f64 {
    300.0
}

fn default_max_speed() -> f64 {
    5.0
}

impl RobotConfig {
    fn new(id: &str, name: &str, robot_type: RobotType, lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            robot_type,
            start_lat: lat,
            start_lon: lon,
            start_alt: 0.0,
            start_heading: 0.0,
            patrol_radius: default_patrol_radius(),
            max_speed: default_max_speed(),
        }
    }

    fn with_motion(mut self, alt: f64, patrol_radius: f64, max_speed: f64) -> Self {
        self.start_alt = alt;
        self.patrol_radius = patrol_radius;
        self.max_speed = max_speed;
        self
    }
}

/// Simulator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Ground station HTTP base URL used for registration
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Tick and position publish period
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    /// Publish health every Nth tick
    #[serde(default = "default_health_every")]
    pub health_every: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_registration_attempts")]
    pub registration_attempts: u32,

    #[serde(default = "default_registration_interval_secs")]
    pub registration_interval_secs: u64,

    #[serde(default = "default_fleet")]
    pub robots: Vec<RobotConfig>,
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_publish_interval_ms() -> u64 {
    500
}

fn default_health_every() -> u64 {
    5
}

fn default_reconnect_delay_secs() -> u64 {
    3
}

fn default_registration_attempts() -> u32 {
    30
}

fn default_registration_interval_secs() -> u64 {
    2
}

/// Los Angeles demo fleet
fn default_fleet() -> Vec<RobotConfig> {
    vec![
        RobotConfig::new("drone-001", "Scout Alpha", RobotType::Drone, 34.0522, -118.2437)
            .with_motion(50.0, 350.0, 8.0),
        RobotConfig::new("drone-002", "Scout Bravo", RobotType::Drone, 34.0536, -118.2415)
            .with_motion(65.0, 250.0, 6.0),
        RobotConfig::new("rover-001", "Rover One", RobotType::Ground, 34.0510, -118.2460)
            .with_motion(0.0, 200.0, 2.0),
        RobotConfig::new("rover-002", "Rover Two", RobotType::Ground, 34.0530, -118.2470)
            .with_motion(0.0, 150.0, 1.5),
        RobotConfig::new("uuv-001", "Depth Finder", RobotType::Underwater, 34.0505, -118.2425)
            .with_motion(-15.0, 180.0, 1.2),
    ]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nats_url: default_nats_url(),
            backend_url: default_backend_url(),
            publish_interval_ms: default_publish_interval_ms(),
            health_every: default_health_every(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            registration_attempts: default_registration_attempts(),
            registration_interval_secs: default_registration_interval_secs(),
            robots: default_fleet(),
        }
    }
}

impl SimConfig {
    /// `NATS_URL` and `BACKEND_URL` override file/default values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NATS_URL") {
            self.nats_url = url;
        }
        if let Ok(url) = std::env::var("BACKEND_URL") {
            self.backend_url = url;
        }
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms.max(1))
    }
}

/// Load configuration from `path` if it exists, defaults otherwise
pub fn load_or_default(path: impl AsRef<Path>) -> Result<SimConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "Simulator config not found, using default fleet");
        return Ok(SimConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path.display()))
}
