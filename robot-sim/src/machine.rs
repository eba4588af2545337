use crate::config::RobotConfig;
use crate::motion::{navigate_toward_target, strategy_for, MotionState, MotionStrategy, NavMode, Target};
use argus::geo::round_to;
use argus::protocol::{AckMessage, CommandMessage, HealthTelemetry, PositionTelemetry};
use argus::robot::RobotType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Messages produced by one tick
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// `acknowledged` for each handled command, then `completed` on arrival
    pub acks: Vec<AckMessage>,
    pub position: PositionTelemetry,
    pub health: Option<HealthTelemetry>,
}

/// Command/navigation state machine for one robot.
///
/// Modes are `Patrol`, `Navigating` and `Stopped`. Commands change intent
/// immediately; physics advance only in [`RobotMachine::tick`]. Arrival is
/// an edge: it is consumed once by [`RobotMachine::take_arrival`].
pub struct RobotMachine {
    config: RobotConfig,
    state: MotionState,
    motion: Box<dyn MotionStrategy>,
    mode: NavMode,
    target: Option<Target>,
    current_command_id: Option<String>,
    arrived: bool,
    ticks: u64,
    health_every: u64,
    rng: StdRng,
}

impl RobotMachine {
    pub fn new(config: RobotConfig, health_every: u64) -> Self {
        Self::with_rng(config, health_every, StdRng::from_entropy())
    }

    /// Deterministic noise and start phase (tests, replays)
    pub fn with_rng(config: RobotConfig, health_every: u64, mut rng: StdRng) -> Self {
        let motion = strategy_for(config.robot_type);
        let altitude = match config.robot_type {
            RobotType::Ground => 0.0,
            _ => config.start_alt,
        };
        let state = MotionState {
            latitude: config.start_lat,
            longitude: config.start_lon,
            altitude,
            heading: config.start_heading,
            speed: config.max_speed,
            battery: 100.0,
            signal: motion.initial_signal(),
            phase: rng.gen_range(0.0..TAU),
        };
        Self {
            config,
            state,
            motion,
            mode: NavMode::Patrol,
            target: None,
            current_command_id: None,
            arrived: false,
            ticks: 0,
            health_every: health_every.max(1),
            rng,
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn current_command_id(&self) -> Option<&str> {
        self.current_command_id.as_deref()
    }

    /// Apply a command. Returns the command id when handled, None otherwise
    /// (unknown type, or `goto` without coordinates).
    pub fn handle_command(&mut self, command: &CommandMessage) -> Option<String> {
        info!(
            robot_id = %self.config.id,
            command_type = %command.command_type,
            command_id = %command.command_id,
            "Command received"
        );
        let params = &command.parameters;

        match command.command_type.as_str() {
            "goto" => {
                let latitude = number(params, "latitude")?;
                let longitude = number(params, "longitude")?;
                let altitude = number(params, "altitude");
                self.navigate_to(
                    Target {
                        latitude,
                        longitude,
                        altitude,
                    },
                    &command.command_id,
                );
            }
            "stop" => {
                self.clear_target();
                self.mode = NavMode::Stopped;
                self.state.speed = 0.0;
            }
            "return_home" => {
                let altitude = match self.config.robot_type {
                    RobotType::Drone => Some(self.config.start_alt),
                    _ => None,
                };
                self.navigate_to(
                    Target {
                        latitude: self.config.start_lat,
                        longitude: self.config.start_lon,
                        altitude,
                    },
                    &command.command_id,
                );
            }
            "patrol" => {
                self.clear_target();
                self.mode = NavMode::Patrol;
                self.state.speed = self.config.max_speed;
            }
            "set_speed" => {
                let speed = number(params, "speed").unwrap_or(self.config.max_speed);
                self.state.speed = speed.clamp(0.0, self.config.max_speed * 2.0);
            }
            other => {
                debug!(robot_id = %self.config.id, command_type = %other, "Unknown command type ignored");
                return None;
            }
        }

        Some(command.command_id.clone())
    }

    /// Advance physics and vitals by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        match self.mode {
            NavMode::Navigating => {
                if let Some(target) = self.target {
                    if navigate_toward_target(&mut self.state, &target, dt) {
                        self.arrived = true;
                    }
                }
            }
            NavMode::Patrol => {
                self.state.phase += self.state.speed / self.config.patrol_radius * dt;
                self.motion.patrol(&mut self.state, &self.config);
            }
            NavMode::Stopped => {}
        }

        self.motion.update_vitals(&mut self.state, dt, &mut self.rng);
    }

    /// Consume the arrival edge.
    ///
    /// On arrival the target is cleared and the robot stops; the command id
    /// recorded for the navigation (if any) is returned for completion.
    pub fn take_arrival(&mut self) -> Option<String> {
        if !self.arrived {
            return None;
        }
        self.arrived = false;
        let command_id = self.current_command_id.take();
        self.clear_target();
        self.mode = NavMode::Stopped;
        info!(robot_id = %self.config.id, command_id = ?command_id, "Navigation target reached");
        command_id
    }

    /// One loop iteration: apply queued commands in order, tick, then report
    pub fn step(&mut self, commands: &[CommandMessage], dt: f64) -> StepOutput {
        let mut acks: Vec<AckMessage> = commands
            .iter()
            .filter_map(|command| self.handle_command(command))
            .map(AckMessage::acknowledged)
            .collect();

        self.tick(dt);
        if let Some(command_id) = self.take_arrival() {
            acks.push(AckMessage::completed(command_id));
        }

        self.ticks += 1;
        let health = (self.ticks % self.health_every == 0).then(|| self.health());

        StepOutput {
            acks,
            position: self.position(),
            health,
        }
    }

    pub fn position(&self) -> PositionTelemetry {
        let speed = match self.mode {
            NavMode::Stopped => 0.0,
            _ => self.state.speed,
        };
        let altitude = match self.config.robot_type {
            RobotType::Ground => 0.0,
            _ => round_to(self.state.altitude, 1),
        };
        PositionTelemetry {
            latitude: round_to(self.state.latitude, 7),
            longitude: round_to(self.state.longitude, 7),
            altitude,
            heading: round_to(self.state.heading, 1),
            speed: round_to(speed, 1),
        }
    }

    pub fn health(&self) -> HealthTelemetry {
        HealthTelemetry {
            battery_percent: round_to(self.state.battery, 1),
            signal_strength: round_to(self.state.signal, 1),
            extra: self.motion.health_extras(&self.state),
        }
    }

    fn navigate_to(&mut self, target: Target, command_id: &str) {
        self.target = Some(target);
        self.current_command_id = Some(command_id.to_string());
        self.arrived = false;
        self.mode = NavMode::Navigating;
        if self.state.speed <= 0.0 {
            self.state.speed = self.config.max_speed;
        }
    }

    fn clear_target(&mut self) {
        self.target = None;
        self.current_command_id = None;
        self.arrived = false;
    }
}

fn number(params: &Map<String, Value>, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}
