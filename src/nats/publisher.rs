use crate::command::CommandBus;
use crate::protocol::{CommandMessage, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Command publisher over core NATS
#[derive(Clone)]
pub struct NatsCommandBus {
    client: async_nats::Client,
}

impl NatsCommandBus {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandBus for NatsCommandBus {
    /// Subject format: argus.{robot_id}.command.execute
    async fn publish_command(&self, robot_id: &str, message: &CommandMessage) -> Result<()> {
        let subject = Topic::CommandExecute.subject(robot_id);
        let payload = serde_json::to_vec(message).context("Failed to serialize command to JSON")?;

        debug!(
            command_id = %message.command_id,
            robot_id = %robot_id,
            subject = %subject,
            "Publishing command to NATS"
        );

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish command to subject '{}'", subject))?;

        // Surface connection loss as a publish error rather than a silent buffer
        self.client
            .flush()
            .await
            .context("Failed to flush command publish")?;

        Ok(())
    }
}
