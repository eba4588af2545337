use crate::protocol::CommandMessage;
use anyhow::Result;
use async_trait::async_trait;

/// Outbound command channel to robots.
///
/// Implemented over NATS by [`crate::nats::NatsCommandBus`]; tests substitute
/// in-memory recorders.
#[async_trait]
pub trait CommandBus: Send + Sync {
    /// Publish `message` on the command channel of `robot_id`
    async fn publish_command(&self, robot_id: &str, message: &CommandMessage) -> Result<()>;
}
