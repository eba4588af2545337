use crate::analysis::{Alert, HeuristicThresholds, ProposedAction, Severity};
use crate::geo::haversine_distance;
use crate::robot::{Position, RobotSnapshot, RobotStatus, RobotType};

/// Rule-based anomaly detection over robot snapshots.
///
/// Pure: output depends only on the snapshots passed in and the static
/// thresholds the analyzer was built with.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    thresholds: HeuristicThresholds,
}

impl HeuristicAnalyzer {
    pub fn new(thresholds: HeuristicThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &HeuristicThresholds {
        &self.thresholds
    }

    /// Check a single robot snapshot.
    ///
    /// Snapshots without position, battery or signal (no telemetry yet, or
    /// non-finite values) produce no alerts.
    pub fn analyze(&self, robot: &RobotSnapshot) -> Vec<Alert> {
        let (Some(position), Some(battery), Some(signal)) =
            (robot.position, robot.battery_percent, robot.signal_strength)
        else {
            return Vec::new();
        };
        if !is_finite_position(&position) || !battery.is_finite() || !signal.is_finite() {
            return Vec::new();
        }

        let t = &self.thresholds;
        let mut alerts = Vec::new();

        if battery <= t.critical_battery_percent {
            alerts.push(Alert {
                robot_id: robot.id.clone(),
                alert_type: "critical_battery".to_string(),
                title: format!("Critical battery: {}", robot.name),
                description: format!(
                    "{} battery at {:.0}%, below the {:.0}% reserve.",
                    robot.name, battery, t.critical_battery_percent
                ),
                reasoning: format!(
                    "Battery under {:.0}% leaves no margin for the return leg. Recall the robot now.",
                    t.critical_battery_percent
                ),
                severity: Severity::Critical,
                requires_ai: false,
                proposed_action: Some(ProposedAction::new("return_home", &robot.id)),
                related_robot_id: None,
            });
        } else if battery <= t.low_battery_percent {
            alerts.push(Alert {
                robot_id: robot.id.clone(),
                alert_type: "low_battery".to_string(),
                title: format!("Low battery: {}", robot.name),
                description: format!("{} battery at {:.0}%.", robot.name, battery),
                reasoning: format!(
                    "Battery under {:.0}%. Returning home before the {:.0}% reserve keeps the robot recoverable.",
                    t.low_battery_percent, t.critical_battery_percent
                ),
                severity: Severity::Warning,
                requires_ai: true,
                proposed_action: Some(ProposedAction::new("return_home", &robot.id)),
                related_robot_id: None,
            });
        }

        if signal <= t.weak_signal_percent {
            alerts.push(Alert {
                robot_id: robot.id.clone(),
                alert_type: "weak_signal".to_string(),
                title: format!("Weak signal: {}", robot.name),
                description: format!("{} signal strength at {:.0}%.", robot.name, signal),
                reasoning: format!(
                    "Link quality under {:.0}% risks losing command and telemetry contact.",
                    t.weak_signal_percent
                ),
                severity: Severity::Warning,
                requires_ai: true,
                proposed_action: None,
                related_robot_id: None,
            });
        }

        if robot.status == RobotStatus::Error {
            alerts.push(Alert {
                robot_id: robot.id.clone(),
                alert_type: "robot_fault".to_string(),
                title: format!("Fault reported: {}", robot.name),
                description: format!("{} reports an error status.", robot.name),
                reasoning: "A robot in error state may not execute commands reliably. Halting it limits further damage.".to_string(),
                severity: Severity::Critical,
                requires_ai: true,
                proposed_action: Some(ProposedAction::new("stop", &robot.id)),
                related_robot_id: None,
            });
        }

        let depth = -position.altitude;
        if robot.robot_type == RobotType::Underwater && depth > t.max_depth_m {
            alerts.push(Alert {
                robot_id: robot.id.clone(),
                alert_type: "depth_limit".to_string(),
                title: format!("Depth limit exceeded: {}", robot.name),
                description: format!(
                    "{} at {:.1} m depth, beyond the {:.0} m operating limit.",
                    robot.name, depth, t.max_depth_m
                ),
                reasoning: "Operating below rated depth stresses the hull and degrades acoustic link quality.".to_string(),
                severity: Severity::Warning,
                requires_ai: false,
                proposed_action: Some(ProposedAction::new("return_home", &robot.id)),
                related_robot_id: None,
            });
        }

        alerts
    }

    /// Pairwise proximity check across the fleet.
    ///
    /// O(n²) over robots with a known position. Each flagged pair yields one
    /// alert attributed to the lexicographically smaller robot id.
    pub fn check_proximity(&self, robots: &[RobotSnapshot]) -> Vec<Alert> {
        let t = &self.thresholds;

        let mut located: Vec<(&RobotSnapshot, Position)> = robots
            .iter()
            .filter_map(|r| r.position.filter(is_finite_position).map(|p| (r, p)))
            .collect();
        located.sort_by(|a, b| a.0.id.cmp(&b.0.id));

        let mut alerts = Vec::new();
        for (i, (a, pa)) in located.iter().enumerate() {
            for (b, pb) in located.iter().skip(i + 1) {
                let vertical = (pa.altitude - pb.altitude).abs();
                if vertical >= t.proximity_vertical_m {
                    continue;
                }
                let distance = haversine_distance(pa.latitude, pa.longitude, pb.latitude, pb.longitude);
                if distance >= t.proximity_distance_m {
                    continue;
                }

                let critical = distance < t.proximity_distance_m / 2.0;
                alerts.push(Alert {
                    robot_id: a.id.clone(),
                    alert_type: "proximity".to_string(),
                    title: format!("Proximity: {} / {}", a.name, b.name),
                    description: format!(
                        "{} ({}) and {} ({}) are {:.1} m apart with {:.1} m vertical separation.",
                        a.name, a.id, b.name, b.id, distance, vertical
                    ),
                    reasoning: format!(
                        "Separation below the {:.0} m safety threshold risks collision or sensor interference.",
                        t.proximity_distance_m
                    ),
                    severity: if critical { Severity::Critical } else { Severity::Warning },
                    requires_ai: true,
                    proposed_action: critical.then(|| ProposedAction::new("stop", &a.id)),
                    related_robot_id: Some(b.id.clone()),
                });
            }
        }

        alerts
    }
}

fn is_finite_position(p: &Position) -> bool {
    p.latitude.is_finite() && p.longitude.is_finite() && p.altitude.is_finite()
}
