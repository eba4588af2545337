// Fan-out of live updates to dashboard clients

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Message pushed to every connected dashboard client
#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast hub for [`Notification`]s.
///
/// Sending with no subscribers is not an error; slow subscribers see
/// `Lagged` and skip ahead.
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self { tx }
    }

    /// Publish `payload` under `msg_type` (e.g. "ai.suggestion")
    pub fn broadcast(&self, msg_type: &str, payload: Value) {
        let notification = Notification {
            msg_type: msg_type.to_string(),
            payload,
            timestamp: Utc::now(),
        };
        let receivers = self.tx.send(notification).unwrap_or(0);
        trace!(msg_type = %msg_type, receivers, "Notification broadcast");
    }

    /// Serialize `payload` and broadcast it; serialization failures are logged
    pub fn broadcast_json<T: Serialize>(&self, msg_type: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.broadcast(msg_type, value),
            Err(e) => warn!(msg_type = %msg_type, error = %e, "Failed to serialize notification"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        let notifier = Notifier::new();
        notifier.broadcast("robot.updated", json!({"id": "drone-001"}));
        assert_eq!(notifier.receiver_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_typed_messages() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.broadcast("ai.suggestion", json!({"title": "Low battery"}));

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.msg_type, "ai.suggestion");
        assert_eq!(msg.payload["title"], "Low battery");

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "ai.suggestion");
        assert!(value.get("timestamp").is_some());
    }
}
