use crate::analysis::AnalysisService;
use crate::command::CommandDispatcher;
use crate::notify::Notifier;
use crate::protocol::{
    AckMessage, AckStatus, HealthTelemetry, PositionTelemetry, StatusMessage, Topic, ALL_SUBJECTS,
};
use crate::robot::{RobotRegistry, RobotSnapshot};
use anyhow::{Context, Result};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

pub const ROBOT_NOTIFICATION: &str = "robot.updated";
pub const COMMAND_NOTIFICATION: &str = "command.updated";

/// Routes robot traffic from `argus.>` into the registry, the analysis
/// service and the command dispatcher.
pub struct TelemetryIngest {
    registry: Arc<RobotRegistry>,
    analysis: Arc<AnalysisService>,
    dispatcher: Arc<CommandDispatcher>,
    notifier: Arc<Notifier>,
}

impl TelemetryIngest {
    pub fn new(
        registry: Arc<RobotRegistry>,
        analysis: Arc<AnalysisService>,
        dispatcher: Arc<CommandDispatcher>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            registry,
            analysis,
            dispatcher,
            notifier,
        }
    }

    /// Subscribe to every robot subject and process messages until the
    /// subscription ends
    pub async fn run(self: Arc<Self>, client: async_nats::Client) -> Result<()> {
        info!(subject = ALL_SUBJECTS, "Starting telemetry ingest");

        let mut subscriber = client
            .subscribe(ALL_SUBJECTS)
            .await
            .context("Failed to subscribe to robot subjects")?;

        while let Some(msg) = subscriber.next().await {
            self.handle_message(msg.subject.as_str(), &msg.payload);
        }

        warn!("Telemetry ingest subscription ended");
        Ok(())
    }

    /// Process one message. Malformed payloads and foreign subjects are
    /// logged and dropped.
    pub fn handle_message(&self, subject: &str, payload: &[u8]) {
        let Some((robot_id, topic)) = Topic::parse(subject) else {
            trace!(subject = %subject, "Ignoring subject outside robot layout");
            return;
        };

        match topic {
            Topic::TelemetryPosition => {
                if let Some(telemetry) = decode::<PositionTelemetry>(subject, payload) {
                    let snapshot = self.registry.apply_position(robot_id, &telemetry);
                    self.on_robot_update(snapshot);
                }
            }
            Topic::TelemetryHealth => {
                if let Some(telemetry) = decode::<HealthTelemetry>(subject, payload) {
                    let snapshot = self.registry.apply_health(robot_id, &telemetry);
                    self.on_robot_update(snapshot);
                }
            }
            Topic::Status => {
                if let Some(message) = decode::<StatusMessage>(subject, payload) {
                    info!(robot_id = %robot_id, status = %message.status, "Robot status announced");
                    let snapshot = self.registry.apply_status(robot_id, &message);
                    self.on_robot_update(snapshot);
                }
            }
            Topic::CommandAck => {
                if let Some(ack) = decode::<AckMessage>(subject, payload) {
                    self.on_ack(robot_id, &ack);
                }
            }
            // Our own outbound commands echo back on the wildcard subscription
            Topic::CommandExecute => {}
        }
    }

    fn on_robot_update(&self, snapshot: Option<RobotSnapshot>) {
        let Some(snapshot) = snapshot else {
            return;
        };
        self.notifier.broadcast_json(ROBOT_NOTIFICATION, &snapshot);
        self.analysis.on_telemetry(&snapshot);
    }

    fn on_ack(&self, robot_id: &str, ack: &AckMessage) {
        let Some(command) = self.dispatcher.apply_ack(ack) else {
            return;
        };

        let snapshot = match ack.status {
            AckStatus::Acknowledged => self
                .registry
                .set_current_command(robot_id, Some(command.id.clone())),
            AckStatus::Completed => self.registry.clear_current_command(robot_id, &command.id),
        };

        self.notifier.broadcast_json(COMMAND_NOTIFICATION, &command);
        if let Some(snapshot) = snapshot {
            self.notifier.broadcast_json(ROBOT_NOTIFICATION, &snapshot);
        }
    }
}

fn decode<T: DeserializeOwned>(subject: &str, payload: &[u8]) -> Option<T> {
    match serde_json::from_slice(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(subject = %subject, error = %e, "Failed to deserialize robot message, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiConfig;
    use crate::analysis::AnalysisConfig;
    use crate::command::{CommandSource, CommandStatus};
    use crate::robot::{RobotStatus, RobotType};
    use crate::suggestion::SuggestionStore;
    use serde_json::{json, Map};

    struct Fixture {
        ingest: TelemetryIngest,
        registry: Arc<RobotRegistry>,
        dispatcher: Arc<CommandDispatcher>,
        suggestions: Arc<SuggestionStore>,
        notifier: Arc<Notifier>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(RobotRegistry::new());
        let suggestions = Arc::new(SuggestionStore::new());
        let dispatcher = Arc::new(CommandDispatcher::new());
        let notifier = Arc::new(Notifier::new());
        let analysis = Arc::new(AnalysisService::new(
            AnalysisConfig::default(),
            AiConfig::default(),
            Arc::clone(&registry),
            Arc::clone(&suggestions),
            Arc::clone(&notifier),
            None,
        ));
        let ingest = TelemetryIngest::new(
            Arc::clone(&registry),
            analysis,
            Arc::clone(&dispatcher),
            Arc::clone(&notifier),
        );
        registry.register("drone-001", "Scout Alpha", RobotType::Drone);
        Fixture {
            ingest,
            registry,
            dispatcher,
            suggestions,
            notifier,
        }
    }

    fn bytes(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_position_updates_registry() {
        let f = fixture();
        f.ingest.handle_message(
            "argus.drone-001.telemetry.position",
            &bytes(json!({"latitude": 34.05, "longitude": -118.24, "altitude": 50.0, "heading": 90.0, "speed": 8.0})),
        );

        let robot = f.registry.get("drone-001").unwrap();
        assert_eq!(robot.position.unwrap().latitude, 34.05);
        assert_eq!(robot.status, RobotStatus::Active);
    }

    #[test]
    fn test_health_feeds_analysis() {
        let f = fixture();
        f.ingest.handle_message(
            "argus.drone-001.telemetry.position",
            &bytes(json!({"latitude": 34.05, "longitude": -118.24, "altitude": 50.0, "heading": 0.0, "speed": 8.0})),
        );
        f.ingest.handle_message(
            "argus.drone-001.telemetry.health",
            &bytes(json!({"battery_percent": 7.0, "signal_strength": 90.0})),
        );

        let pending = f.suggestions.get_pending(Some("drone-001"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].proposed_action.as_ref().unwrap().command_type, "return_home");
    }

    #[test]
    fn test_malformed_and_unknown_are_dropped() {
        let f = fixture();
        let mut rx = f.notifier.subscribe();

        f.ingest.handle_message("argus.drone-001.telemetry.position", b"{not json");
        f.ingest.handle_message(
            "argus.ghost-9.telemetry.health",
            &bytes(json!({"battery_percent": 5.0, "signal_strength": 5.0})),
        );
        f.ingest.handle_message("fleet.events.sensor", b"{}");

        assert!(f.registry.get("drone-001").unwrap().position.is_none());
        assert!(f.registry.get("ghost-9").is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_acks_drive_command_and_robot_state() {
        let f = fixture();
        let cmd = f
            .dispatcher
            .create_command("drone-001", "goto", Map::new(), CommandSource::Operator);
        f.dispatcher.update_status(&cmd.id, CommandStatus::Sent);
        let subject = "argus.drone-001.command.ack";

        f.ingest
            .handle_message(subject, &bytes(json!({"command_id": cmd.id, "status": "acknowledged"})));
        assert_eq!(f.dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Acknowledged);
        assert_eq!(
            f.registry.get("drone-001").unwrap().current_command_id.as_deref(),
            Some(cmd.id.as_str())
        );

        f.ingest
            .handle_message(subject, &bytes(json!({"command_id": cmd.id, "status": "completed"})));
        assert_eq!(f.dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Completed);
        assert!(f.registry.get("drone-001").unwrap().current_command_id.is_none());
    }

    #[test]
    fn test_ack_notifications() {
        let f = fixture();
        let cmd = f
            .dispatcher
            .create_command("drone-001", "stop", Map::new(), CommandSource::Ai);
        let mut rx = f.notifier.subscribe();

        f.ingest.handle_message(
            "argus.drone-001.command.ack",
            &bytes(json!({"command_id": cmd.id, "status": "completed"})),
        );

        let first = rx.try_recv().unwrap();
        assert_eq!(first.msg_type, COMMAND_NOTIFICATION);
        assert_eq!(first.payload["status"], "completed");
        assert_eq!(rx.try_recv().unwrap().msg_type, ROBOT_NOTIFICATION);

        // Duplicate completion changes nothing and broadcasts nothing
        f.ingest.handle_message(
            "argus.drone-001.command.ack",
            &bytes(json!({"command_id": cmd.id, "status": "completed"})),
        );
        assert!(rx.try_recv().is_err());
    }
}
