use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Alert / suggestion severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command proposed alongside an alert or suggestion.
///
/// `robot_id` may be omitted by AI responses; approval then targets the
/// suggestion's own robot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    #[serde(rename = "commandType")]
    pub command_type: String,
    #[serde(rename = "robotId", default, skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ProposedAction {
    /// Parameterless action targeting `robot_id`
    pub fn new(command_type: &str, robot_id: &str) -> Self {
        Self {
            command_type: command_type.to_string(),
            robot_id: Some(robot_id.to_string()),
            parameters: Map::new(),
        }
    }
}

/// Transient finding from heuristic or proximity analysis.
///
/// Consumed exactly once by the escalation step; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub robot_id: String,
    pub alert_type: String,
    pub title: String,
    pub description: String,
    pub reasoning: String,
    pub severity: Severity,
    pub requires_ai: bool,
    pub proposed_action: Option<ProposedAction>,
    /// Other robot involved, for pairwise alerts such as proximity
    pub related_robot_id: Option<String>,
}

impl Alert {
    /// Identity used to suppress repeats: one per robot, alert type and
    /// (for pairwise alerts) partner robot
    pub fn cooldown_key(&self) -> (String, String, Option<String>) {
        (
            self.robot_id.clone(),
            self.alert_type.clone(),
            self.related_robot_id.clone(),
        )
    }
}
