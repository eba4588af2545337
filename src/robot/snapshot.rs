use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Robot platform type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotType {
    Drone,
    Ground,
    Underwater,
}

impl RobotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotType::Drone => "drone",
            RobotType::Ground => "ground",
            RobotType::Underwater => "underwater",
        }
    }

    /// Parse the wire tag ("drone", "ground", "underwater")
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "drone" => Some(RobotType::Drone),
            "ground" => Some(RobotType::Ground),
            "underwater" => Some(RobotType::Underwater),
            _ => None,
        }
    }
}

impl fmt::Display for RobotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status reported by (or inferred for) a robot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    Idle,
    Active,
    Returning,
    Error,
    Offline,
}

impl RobotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotStatus::Idle => "idle",
            RobotStatus::Active => "active",
            RobotStatus::Returning => "returning",
            RobotStatus::Error => "error",
            RobotStatus::Offline => "offline",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "idle" => Some(RobotStatus::Idle),
            "active" => Some(RobotStatus::Active),
            "returning" => Some(RobotStatus::Returning),
            "error" => Some(RobotStatus::Error),
            "offline" => Some(RobotStatus::Offline),
            _ => None,
        }
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geodetic position (altitude in meters, negative below the surface)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Latest known state of a robot.
///
/// Telemetry-derived fields stay `None` until the first matching frame arrives;
/// analysis skips snapshots that are still incomplete.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotSnapshot {
    pub id: String,
    pub name: String,
    pub robot_type: RobotType,
    pub status: RobotStatus,
    pub position: Option<Position>,
    pub heading: f64,
    pub speed: f64,
    pub battery_percent: Option<f64>,
    pub signal_strength: Option<f64>,
    pub current_command_id: Option<String>,
    /// Type-specific health extras (wheel_speed, depth, pressure_atm)
    pub metadata: Map<String, Value>,
    pub last_seen: DateTime<Utc>,
}

impl RobotSnapshot {
    /// Fresh snapshot for a newly registered robot (no telemetry yet)
    pub fn new(id: impl Into<String>, name: impl Into<String>, robot_type: RobotType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            robot_type,
            status: RobotStatus::Idle,
            position: None,
            heading: 0.0,
            speed: 0.0,
            battery_percent: None,
            signal_strength: None,
            current_command_id: None,
            metadata: Map::new(),
            last_seen: Utc::now(),
        }
    }
}
