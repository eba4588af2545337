use serde::Deserialize;

/// Analysis pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Period of the proximity scan (seconds)
    #[serde(default = "default_proximity_interval")]
    pub proximity_interval_seconds: u64,

    /// Suppress repeats of the same (robot, alert type) inside this window (seconds)
    #[serde(default = "default_alert_cooldown")]
    pub alert_cooldown_seconds: u64,

    #[serde(default)]
    pub thresholds: HeuristicThresholds,
}

fn default_proximity_interval() -> u64 {
    10
}

fn default_alert_cooldown() -> u64 {
    60
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            proximity_interval_seconds: default_proximity_interval(),
            alert_cooldown_seconds: default_alert_cooldown(),
            thresholds: HeuristicThresholds::default(),
        }
    }
}

/// Static thresholds used by the heuristic analyzer
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicThresholds {
    #[serde(default = "default_critical_battery")]
    pub critical_battery_percent: f64,
    #[serde(default = "default_low_battery")]
    pub low_battery_percent: f64,
    #[serde(default = "default_weak_signal")]
    pub weak_signal_percent: f64,
    /// Maximum operating depth for underwater robots (meters)
    #[serde(default = "default_max_depth")]
    pub max_depth_m: f64,
    /// Horizontal separation below which two robots are flagged (meters)
    #[serde(default = "default_proximity_distance")]
    pub proximity_distance_m: f64,
    /// Vertical separation below which two robots share airspace/waterspace (meters)
    #[serde(default = "default_proximity_vertical")]
    pub proximity_vertical_m: f64,
}

fn default_critical_battery() -> f64 {
    10.0
}

fn default_low_battery() -> f64 {
    25.0
}

fn default_weak_signal() -> f64 {
    30.0
}

fn default_max_depth() -> f64 {
    50.0
}

fn default_proximity_distance() -> f64 {
    30.0
}

fn default_proximity_vertical() -> f64 {
    15.0
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            critical_battery_percent: default_critical_battery(),
            low_battery_percent: default_low_battery(),
            weak_signal_percent: default_weak_signal(),
            max_depth_m: default_max_depth(),
            proximity_distance_m: default_proximity_distance(),
            proximity_vertical_m: default_proximity_vertical(),
        }
    }
}
