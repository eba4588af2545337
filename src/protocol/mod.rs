// Wire messages exchanged between the ground station and robot peers over NATS.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};


/// Root token of every Argus subject
pub const SUBJECT_ROOT: &str = "argus";

/// Wildcard covering every robot subject
pub const ALL_SUBJECTS: &str = "argus.>";

/// Ground → robot: command to execute
///
/// Subject: argus.{robot_id}.command.execute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command_id: String,
    pub command_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Acknowledgment status reported by a robot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Acknowledged,
    Completed,
}

/// Robot → ground: command acknowledgment or completion
///
/// Subject: argus.{robot_id}.command.ack
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AckMessage {
    pub command_id: String,
    pub status: AckStatus,
}

impl AckMessage {
    pub fn acknowledged(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            status: AckStatus::Acknowledged,
        }
    }

    pub fn completed(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            status: AckStatus::Completed,
        }
    }
}

/// Robot → ground: periodic position telemetry
///
/// Producers round position to 7 decimals and altitude/heading/speed to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionTelemetry {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub heading: f64,
    pub speed: f64,
}

/// Robot → ground: health telemetry (every Nth tick)
///
/// Type-specific fields (`wheel_speed`, `depth`, `pressure_atm`) travel in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthTelemetry {
    pub battery_percent: f64,
    pub signal_strength: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Robot → ground: status announcement published on connect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub robot_type: String,
}

/// Channel kinds addressed per robot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    CommandExecute,
    CommandAck,
    TelemetryPosition,
    TelemetryHealth,
    Status,
}

impl Topic {
    fn suffix(&self) -> &'static str {
        match self {
            Topic::CommandExecute => "command.execute",
            Topic::CommandAck => "command.ack",
            Topic::TelemetryPosition => "telemetry.position",
            Topic::TelemetryHealth => "telemetry.health",
            Topic::Status => "status",
        }
    }

    /// Build the subject for this topic on `robot_id`
    pub fn subject(&self, robot_id: &str) -> String {
        format!("{}.{}.{}", SUBJECT_ROOT, robot_id, self.suffix())
    }

    /// Split a subject into `(robot_id, topic)`.
    ///
    /// Returns None for subjects outside the Argus layout.
    pub fn parse(subject: &str) -> Option<(&str, Topic)> {
        let rest = subject.strip_prefix(SUBJECT_ROOT)?.strip_prefix('.')?;
        let (robot_id, suffix) = rest.split_once('.')?;
        if robot_id.is_empty() {
            return None;
        }
        let topic = match suffix {
            "command.execute" => Topic::CommandExecute,
            "command.ack" => Topic::CommandAck,
            "telemetry.position" => Topic::TelemetryPosition,
            "telemetry.health" => Topic::TelemetryHealth,
            "status" => Topic::Status,
            _ => return None,
        };
        Some((robot_id, topic))
    }
}
