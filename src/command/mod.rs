// Commands dispatched to robots and their acknowledgment lifecycle

mod bus;
mod dispatcher;

pub use bus::CommandBus;
pub use dispatcher::CommandDispatcher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[cfg(test)]
mod tests;

/// Who issued a command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    Ai,
    Operator,
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSource::Ai => f.write_str("ai"),
            CommandSource::Operator => f.write_str("operator"),
        }
    }
}

/// Command status: pending → sent → acknowledged → completed, or failed at any stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Sent,
    Acknowledged,
    Completed,
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(&self, next: CommandStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            CommandStatus::Failed => true,
            _ => next.rank() > self.rank(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CommandStatus::Pending => 0,
            CommandStatus::Sent => 1,
            CommandStatus::Acknowledged => 2,
            CommandStatus::Completed | CommandStatus::Failed => 3,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Sent => "sent",
            CommandStatus::Acknowledged => "acknowledged",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Instruction dispatched to a specific robot
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub robot_id: String,
    pub command_type: String,
    pub parameters: Map<String, Value>,
    pub source: CommandSource,
    pub status: CommandStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
