use super::*;
use crate::protocol::{AckMessage, CommandMessage};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Records published commands; optionally fails every publish
#[derive(Default)]
struct RecordingBus {
    published: Mutex<Vec<(String, CommandMessage)>>,
    fail: bool,
}

#[async_trait]
impl CommandBus for RecordingBus {
    async fn publish_command(&self, robot_id: &str, message: &CommandMessage) -> Result<()> {
        if self.fail {
            bail!("broker unavailable");
        }
        self.published
            .lock()
            .unwrap()
            .push((robot_id.to_string(), message.clone()));
        Ok(())
    }
}

fn goto_params() -> Map<String, serde_json::Value> {
    json!({"latitude": 34.05, "longitude": -118.24})
        .as_object()
        .unwrap()
        .clone()
}

#[test]
fn test_create_command_is_pending() {
    let dispatcher = CommandDispatcher::new();
    let cmd = dispatcher.create_command("drone-001", "goto", goto_params(), CommandSource::Operator);

    assert_eq!(cmd.status, CommandStatus::Pending);
    assert_eq!(cmd.robot_id, "drone-001");
    assert_eq!(dispatcher.get(&cmd.id).unwrap().command_type, "goto");
}

#[test]
fn test_forward_transitions() {
    let dispatcher = CommandDispatcher::new();
    let cmd = dispatcher.create_command("drone-001", "stop", Map::new(), CommandSource::Ai);

    assert_eq!(
        dispatcher.update_status(&cmd.id, CommandStatus::Sent).unwrap().status,
        CommandStatus::Sent
    );
    assert_eq!(
        dispatcher.update_status(&cmd.id, CommandStatus::Acknowledged).unwrap().status,
        CommandStatus::Acknowledged
    );
    // Backwards is ignored
    assert!(dispatcher.update_status(&cmd.id, CommandStatus::Sent).is_none());
    assert_eq!(dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Acknowledged);
}

#[test]
fn test_terminal_commands_are_frozen() {
    let dispatcher = CommandDispatcher::new();
    let cmd = dispatcher.create_command("drone-001", "stop", Map::new(), CommandSource::Ai);
    dispatcher.update_status(&cmd.id, CommandStatus::Failed).unwrap();

    assert!(dispatcher.update_status(&cmd.id, CommandStatus::Completed).is_none());
    assert!(dispatcher.update_status(&cmd.id, CommandStatus::Failed).is_none());
    assert_eq!(dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Failed);
}

#[test]
fn test_ack_lifecycle_and_duplicates() {
    let dispatcher = CommandDispatcher::new();
    let cmd = dispatcher.create_command("drone-001", "goto", goto_params(), CommandSource::Ai);
    dispatcher.update_status(&cmd.id, CommandStatus::Sent);

    let acked = dispatcher.apply_ack(&AckMessage::acknowledged(&cmd.id)).unwrap();
    assert_eq!(acked.status, CommandStatus::Acknowledged);

    let done = dispatcher.apply_ack(&AckMessage::completed(&cmd.id)).unwrap();
    assert_eq!(done.status, CommandStatus::Completed);

    // Duplicate acks for a terminal command are ignored
    assert!(dispatcher.apply_ack(&AckMessage::completed(&cmd.id)).is_none());
    assert!(dispatcher.apply_ack(&AckMessage::acknowledged(&cmd.id)).is_none());
    assert_eq!(dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Completed);
}

#[test]
fn test_completed_may_skip_acknowledged() {
    let dispatcher = CommandDispatcher::new();
    let cmd = dispatcher.create_command("drone-001", "goto", goto_params(), CommandSource::Ai);
    dispatcher.update_status(&cmd.id, CommandStatus::Sent);

    let done = dispatcher.apply_ack(&AckMessage::completed(&cmd.id)).unwrap();
    assert_eq!(done.status, CommandStatus::Completed);
}

#[test]
fn test_ack_for_unknown_command_is_ignored() {
    let dispatcher = CommandDispatcher::new();
    assert!(dispatcher.apply_ack(&AckMessage::completed("nope")).is_none());
}

#[test]
fn test_active_command_is_most_recent_non_terminal() {
    let dispatcher = CommandDispatcher::new();
    let first = dispatcher.create_command("drone-001", "patrol", Map::new(), CommandSource::Operator);
    thread::sleep(Duration::from_millis(2));
    let second = dispatcher.create_command("drone-001", "goto", goto_params(), CommandSource::Operator);
    thread::sleep(Duration::from_millis(2));
    let third = dispatcher.create_command("drone-001", "stop", Map::new(), CommandSource::Operator);
    dispatcher.create_command("rover-001", "stop", Map::new(), CommandSource::Operator);

    dispatcher.update_status(&third.id, CommandStatus::Completed);
    assert_eq!(dispatcher.get_active_command("drone-001").unwrap().id, second.id);

    dispatcher.update_status(&second.id, CommandStatus::Failed);
    assert_eq!(dispatcher.get_active_command("drone-001").unwrap().id, first.id);

    dispatcher.update_status(&first.id, CommandStatus::Completed);
    assert!(dispatcher.get_active_command("drone-001").is_none());
    assert!(dispatcher.get_active_command("uuv-001").is_none());
}

#[test]
fn test_robot_commands_most_recent_first() {
    let dispatcher = CommandDispatcher::new();
    let first = dispatcher.create_command("drone-001", "patrol", Map::new(), CommandSource::Operator);
    thread::sleep(Duration::from_millis(2));
    let second = dispatcher.create_command("drone-001", "stop", Map::new(), CommandSource::Ai);
    dispatcher.create_command("rover-001", "stop", Map::new(), CommandSource::Ai);

    let ids: Vec<String> = dispatcher
        .get_robot_commands("drone-001")
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_send_command_publishes_then_marks_sent() {
    let dispatcher = CommandDispatcher::new();
    let bus = RecordingBus::default();

    let cmd = dispatcher
        .send_command(&bus, "drone-001", "goto", goto_params(), CommandSource::Ai)
        .await
        .unwrap();
    assert_eq!(cmd.status, CommandStatus::Sent);

    let published = bus.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "drone-001");
    assert_eq!(published[0].1.command_id, cmd.id);
    assert_eq!(published[0].1.command_type, "goto");
    assert_eq!(published[0].1.parameters, goto_params());
}

#[tokio::test]
async fn test_send_command_publish_failure_marks_failed() {
    let dispatcher = CommandDispatcher::new();
    let bus = RecordingBus {
        fail: true,
        ..Default::default()
    };

    let result = dispatcher
        .send_command(&bus, "drone-001", "stop", Map::new(), CommandSource::Operator)
        .await;
    assert!(result.is_err());

    let commands = dispatcher.get_robot_commands("drone-001");
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].status, CommandStatus::Failed);
}

#[tokio::test]
async fn test_concurrent_acks_keep_forward_order() {
    let dispatcher = Arc::new(CommandDispatcher::new());
    let cmd = dispatcher.create_command("drone-001", "goto", goto_params(), CommandSource::Ai);
    dispatcher.update_status(&cmd.id, CommandStatus::Sent);

    let mut handles = Vec::new();
    for i in 0..10 {
        let dispatcher = Arc::clone(&dispatcher);
        let id = cmd.id.clone();
        handles.push(tokio::spawn(async move {
            let ack = if i % 2 == 0 {
                AckMessage::acknowledged(id)
            } else {
                AckMessage::completed(id)
            };
            dispatcher.apply_ack(&ack);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(dispatcher.get(&cmd.id).unwrap().status, CommandStatus::Completed);
}
