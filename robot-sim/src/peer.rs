//! Network side of a simulated robot: registration, NATS session and the
//! tick loop driving a [`RobotMachine`].

use crate::config::{RobotConfig, SimConfig};
use crate::machine::{RobotMachine, StepOutput};
use anyhow::{Context, Result};
use argus::protocol::{CommandMessage, StatusMessage, Topic};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct RegisterBody<'a> {
    id: &'a str,
    name: &'a str,
    robot_type: &'a str,
}

/// Register `robot` with the ground station, retrying while it starts up.
///
/// Returns false once attempts are exhausted; the caller proceeds anyway.
pub async fn register_robot(http: &reqwest::Client, sim: &SimConfig, robot: &RobotConfig) -> bool {
    let url = format!("{}/api/robots", sim.backend_url.trim_end_matches('/'));
    let body = RegisterBody {
        id: &robot.id,
        name: &robot.name,
        robot_type: robot.robot_type.as_str(),
    };

    for attempt in 1..=sim.registration_attempts {
        match post_registration(http, &url, &body).await {
            Ok(()) => {
                info!(robot_id = %robot.id, attempt, "Registered with ground station");
                return true;
            }
            Err(e) => {
                debug!(robot_id = %robot.id, attempt, error = %e, "Registration attempt failed");
            }
        }
        if attempt < sim.registration_attempts {
            tokio::time::sleep(Duration::from_secs(sim.registration_interval_secs)).await;
        }
    }

    warn!(
        robot_id = %robot.id,
        attempts = sim.registration_attempts,
        "Registration failed, starting without it"
    );
    false
}

async fn post_registration(http: &reqwest::Client, url: &str, body: &RegisterBody<'_>) -> Result<()> {
    let response = http
        .post(url)
        .timeout(REGISTRATION_TIMEOUT)
        .json(body)
        .send()
        .await
        .context("Failed to send registration request")?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        anyhow::bail!("Ground station returned status {}: {}", status, text);
    }
    Ok(())
}

/// Run one robot forever: register and hold a NATS session, starting over
/// after `reconnect_delay_secs` whenever the session drops.
///
/// The state machine survives reconnects, so a robot resumes where it was.
pub async fn run_robot(robot: RobotConfig, sim: Arc<SimConfig>) {
    let http = reqwest::Client::new();
    let mut machine = RobotMachine::new(robot.clone(), sim.health_every);
    let reconnect_delay = Duration::from_secs(sim.reconnect_delay_secs);

    loop {
        register_robot(&http, &sim, &robot).await;
        if let Err(e) = run_session(&robot, &sim, &mut machine).await {
            warn!(
                robot_id = %robot.id,
                error = %e,
                delay_secs = sim.reconnect_delay_secs,
                "Robot session ended, reconnecting"
            );
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn run_session(robot: &RobotConfig, sim: &SimConfig, machine: &mut RobotMachine) -> Result<()> {
    let client = async_nats::connect(&sim.nats_url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", sim.nats_url))?;
    info!(robot_id = %robot.id, url = %sim.nats_url, "Connected to NATS");

    publish_json(
        &client,
        Topic::Status.subject(&robot.id),
        &StatusMessage {
            status: "active".to_string(),
            robot_type: robot.robot_type.as_str().to_string(),
        },
    )
    .await?;

    let mut subscriber = client
        .subscribe(Topic::CommandExecute.subject(&robot.id))
        .await
        .context("Failed to subscribe to command subject")?;

    let (tx, mut rx) = mpsc::unbounded_channel::<CommandMessage>();
    let robot_id = robot.id.clone();
    let listener = async move {
        while let Some(msg) = subscriber.next().await {
            match serde_json::from_slice::<CommandMessage>(&msg.payload) {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(robot_id = %robot_id, error = %e, "Malformed command dropped");
                }
            }
        }
    };

    tokio::select! {
        _ = listener => anyhow::bail!("Command subscription closed"),
        result = tick_loop(&client, robot, sim, machine, &mut rx) => result,
    }
}

/// Drain queued commands, step the machine, publish what it produced
async fn tick_loop(
    client: &async_nats::Client,
    robot: &RobotConfig,
    sim: &SimConfig,
    machine: &mut RobotMachine,
    rx: &mut mpsc::UnboundedReceiver<CommandMessage>,
) -> Result<()> {
    let period = sim.publish_interval();
    let dt = period.as_secs_f64();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }

        let output = machine.step(&commands, dt);
        publish_step(client, &robot.id, &output).await?;
    }
}

async fn publish_step(client: &async_nats::Client, robot_id: &str, output: &StepOutput) -> Result<()> {
    for ack in &output.acks {
        publish_json(client, Topic::CommandAck.subject(robot_id), ack).await?;
        debug!(robot_id = %robot_id, command_id = %ack.command_id, status = ?ack.status, "Ack published");
    }
    publish_json(client, Topic::TelemetryPosition.subject(robot_id), &output.position).await?;
    if let Some(health) = &output.health {
        publish_json(client, Topic::TelemetryHealth.subject(robot_id), health).await?;
    }
    Ok(())
}

async fn publish_json<T: Serialize>(client: &async_nats::Client, subject: String, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value).context("Failed to serialize message")?;
    client
        .publish(subject, payload.into())
        .await
        .context("Failed to publish to NATS")?;
    Ok(())
}
