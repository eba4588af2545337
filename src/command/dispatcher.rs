use crate::command::{Command, CommandBus, CommandSource, CommandStatus};
use crate::protocol::{AckMessage, AckStatus, CommandMessage};
use anyhow::{Context, Result};
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Command store and status tracker.
///
/// Status changes are forward-only (see [`CommandStatus::can_advance_to`]) and
/// applied under the per-command entry guard. A late `sent` cannot overwrite
/// an `acknowledged` that raced ahead of it, and acks for terminal commands
/// are ignored.
pub struct CommandDispatcher {
    commands: DashMap<String, Command>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self {
            commands: DashMap::new(),
        }
    }

    /// Create a pending command (not yet published)
    pub fn create_command(
        &self,
        robot_id: &str,
        command_type: &str,
        parameters: Map<String, Value>,
        source: CommandSource,
    ) -> Command {
        let now = Utc::now();
        let command = Command {
            id: Uuid::now_v7().to_string(),
            robot_id: robot_id.to_string(),
            command_type: command_type.to_string(),
            parameters,
            source,
            status: CommandStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.commands.insert(command.id.clone(), command.clone());

        info!(
            command_id = %command.id,
            robot_id = %robot_id,
            command_type = %command_type,
            source = %source,
            "Command created"
        );
        command
    }

    /// Move a command to `status`.
    ///
    /// Returns the updated command, or None when the id is unknown or the
    /// transition is not forward (including any change to a terminal command).
    pub fn update_status(&self, id: &str, status: CommandStatus) -> Option<Command> {
        let mut command = self.commands.get_mut(id)?;
        if !command.status.can_advance_to(status) {
            debug!(
                command_id = %id,
                from = %command.status,
                to = %status,
                "Ignoring non-forward command transition"
            );
            return None;
        }
        command.status = status;
        command.updated_at = Utc::now();

        info!(command_id = %id, status = %status, "Command status updated");
        Some(command.clone())
    }

    /// Apply a robot acknowledgment. Unknown or already-terminal ids are ignored.
    pub fn apply_ack(&self, ack: &AckMessage) -> Option<Command> {
        if !self.commands.contains_key(&ack.command_id) {
            debug!(command_id = %ack.command_id, "Ack for unknown command ignored");
            return None;
        }
        let status = match ack.status {
            AckStatus::Acknowledged => CommandStatus::Acknowledged,
            AckStatus::Completed => CommandStatus::Completed,
        };
        self.update_status(&ack.command_id, status)
    }

    pub fn get(&self, id: &str) -> Option<Command> {
        self.commands.get(id).map(|c| c.clone())
    }

    /// Most recent non-terminal command for `robot_id`
    pub fn get_active_command(&self, robot_id: &str) -> Option<Command> {
        self.get_robot_commands(robot_id)
            .into_iter()
            .find(|c| !c.status.is_terminal())
    }

    /// All commands for `robot_id`, most recent first
    pub fn get_robot_commands(&self, robot_id: &str) -> Vec<Command> {
        let mut commands: Vec<Command> = self
            .commands
            .iter()
            .filter(|c| c.robot_id == robot_id)
            .map(|c| c.value().clone())
            .collect();
        commands.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        commands
    }

    /// Create, publish, then mark `sent`, in that order.
    ///
    /// A crash between publish and the `sent` transition leaves the command
    /// observably `pending`. A publish error marks it `failed` and is returned.
    pub async fn send_command(
        &self,
        bus: &dyn CommandBus,
        robot_id: &str,
        command_type: &str,
        parameters: Map<String, Value>,
        source: CommandSource,
    ) -> Result<Command> {
        let command = self.create_command(robot_id, command_type, parameters, source);
        let message = CommandMessage {
            command_id: command.id.clone(),
            command_type: command.command_type.clone(),
            parameters: command.parameters.clone(),
        };

        if let Err(e) = bus.publish_command(robot_id, &message).await {
            warn!(command_id = %command.id, robot_id = %robot_id, error = %e, "Command publish failed");
            self.update_status(&command.id, CommandStatus::Failed);
            return Err(e).context(format!("Failed to publish command {}", command.id));
        }

        // An ack may already have advanced the command past `sent`
        Ok(self
            .update_status(&command.id, CommandStatus::Sent)
            .or_else(|| self.get(&command.id))
            .unwrap_or(command))
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
