use crate::protocol::{HealthTelemetry, PositionTelemetry, StatusMessage};
use crate::robot::{Position, RobotSnapshot, RobotStatus, RobotType};
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};

/// Registry of the latest snapshot per robot id.
///
/// Every update runs under the DashMap entry guard for that robot, so readers
/// never observe a half-applied telemetry frame.
pub struct RobotRegistry {
    robots: DashMap<String, RobotSnapshot>,
}

impl RobotRegistry {
    pub fn new() -> Self {
        Self {
            robots: DashMap::new(),
        }
    }

    /// Register a robot, or refresh name/type of an existing one.
    ///
    /// Telemetry already held for the robot is preserved across re-registration.
    pub fn register(&self, id: &str, name: &str, robot_type: RobotType) -> RobotSnapshot {
        let mut entry = self
            .robots
            .entry(id.to_string())
            .or_insert_with(|| RobotSnapshot::new(id, name, robot_type));
        entry.name = name.to_string();
        entry.robot_type = robot_type;
        entry.last_seen = Utc::now();

        info!(robot_id = %id, robot_type = %robot_type, "Robot registered");
        entry.clone()
    }

    /// Get robot snapshot by ID
    pub fn get(&self, id: &str) -> Option<RobotSnapshot> {
        self.robots.get(id).map(|r| r.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.robots.contains_key(id)
    }

    /// All snapshots, ordered by robot id
    pub fn all(&self) -> Vec<RobotSnapshot> {
        let mut robots: Vec<RobotSnapshot> = self.robots.iter().map(|r| r.value().clone()).collect();
        robots.sort_by(|a, b| a.id.cmp(&b.id));
        robots
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// Apply a position frame. Returns the updated snapshot, or None for unknown robots.
    pub fn apply_position(&self, id: &str, telemetry: &PositionTelemetry) -> Option<RobotSnapshot> {
        self.update(id, |robot| {
            robot.position = Some(Position {
                latitude: telemetry.latitude,
                longitude: telemetry.longitude,
                altitude: telemetry.altitude,
            });
            robot.heading = telemetry.heading;
            robot.speed = telemetry.speed;
            if matches!(robot.status, RobotStatus::Idle | RobotStatus::Offline) {
                robot.status = RobotStatus::Active;
            }
        })
    }

    /// Apply a health frame. Returns the updated snapshot, or None for unknown robots.
    pub fn apply_health(&self, id: &str, telemetry: &HealthTelemetry) -> Option<RobotSnapshot> {
        self.update(id, |robot| {
            robot.battery_percent = Some(telemetry.battery_percent);
            robot.signal_strength = Some(telemetry.signal_strength);
            for (key, value) in &telemetry.extra {
                robot.metadata.insert(key.clone(), value.clone());
            }
        })
    }

    /// Apply a status announcement. Unrecognized status tags leave the status unchanged.
    pub fn apply_status(&self, id: &str, message: &StatusMessage) -> Option<RobotSnapshot> {
        self.update(id, |robot| match RobotStatus::parse(&message.status) {
            Some(status) => robot.status = status,
            None => debug!(robot_id = %robot.id, status = %message.status, "Ignoring unknown robot status"),
        })
    }

    /// Record (or clear) the command a robot is currently executing
    pub fn set_current_command(&self, id: &str, command_id: Option<String>) -> Option<RobotSnapshot> {
        self.update(id, |robot| robot.current_command_id = command_id)
    }

    /// Clear `current_command_id` if it still points at `command_id`
    pub fn clear_current_command(&self, id: &str, command_id: &str) -> Option<RobotSnapshot> {
        self.update(id, |robot| {
            if robot.current_command_id.as_deref() == Some(command_id) {
                robot.current_command_id = None;
            }
        })
    }

    fn update<F>(&self, id: &str, apply: F) -> Option<RobotSnapshot>
    where
        F: FnOnce(&mut RobotSnapshot),
    {
        let mut robot = match self.robots.get_mut(id) {
            Some(robot) => robot,
            None => {
                debug!(robot_id = %id, "Update for unregistered robot dropped");
                return None;
            }
        };
        apply(robot.value_mut());
        robot.last_seen = Utc::now();
        Some(robot.clone())
    }
}

impl Default for RobotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
