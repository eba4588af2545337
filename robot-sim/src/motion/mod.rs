//! Per-platform motion strategies.
//!
//! The state machine owns navigation intent; a [`MotionStrategy`] supplies the
//! platform-specific pieces: the patrol curve, vitals drift and extra health
//! fields. Point-to-point navigation is shared by every platform
//! ([`navigate_toward_target`]).

mod aerial;
mod ground;
mod submersible;

pub use aerial::AerialMotion;
pub use ground::GroundMotion;
pub use submersible::SubmersibleMotion;

use crate::config::RobotConfig;
use argus::geo::{bearing_between, haversine_distance, offset_coords};
use argus::robot::RobotType;
use rand::RngCore;
use serde_json::{Map, Value};

/// Distance under which a navigation target counts as reached (meters)
pub const ARRIVAL_THRESHOLD_M: f64 = 5.0;

/// Maximum vertical rate while navigating (m/s)
pub const MAX_CLIMB_RATE: f64 = 2.0;

/// Battery level around which the drain/recharge cycle turns (percent)
const BATTERY_FLOOR: f64 = 20.0;

/// Navigation mode of a robot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavMode {
    Patrol,
    Navigating,
    Stopped,
}

/// Navigation target; `altitude` None keeps the current altitude
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Physical state advanced every tick
#[derive(Clone, Debug)]
pub struct MotionState {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Degrees, 0 = north
    pub heading: f64,
    /// Commanded speed in m/s (reported as 0 while stopped)
    pub speed: f64,
    pub battery: f64,
    pub signal: f64,
    /// Patrol curve parameter in radians; survives mode changes
    pub phase: f64,
}

/// Platform-specific motion behavior
pub trait MotionStrategy: Send {
    /// Place the robot on its patrol curve at `state.phase`
    fn patrol(&mut self, state: &mut MotionState, config: &RobotConfig);

    /// Drift battery and signal (and any platform sensors) over `dt` seconds
    fn update_vitals(&mut self, state: &mut MotionState, dt: f64, rng: &mut dyn RngCore);

    /// Platform-specific health fields
    fn health_extras(&self, state: &MotionState) -> Map<String, Value>;

    /// Signal strength at power-on
    fn initial_signal(&self) -> f64;
}

/// Strategy for a robot type
pub fn strategy_for(robot_type: RobotType) -> Box<dyn MotionStrategy> {
    match robot_type {
        RobotType::Drone => Box::new(AerialMotion),
        RobotType::Ground => Box::new(GroundMotion::default()),
        RobotType::Underwater => Box::new(SubmersibleMotion),
    }
}

/// Move toward `target` by at most `speed × dt`. Returns true on arrival.
///
/// Under [`ARRIVAL_THRESHOLD_M`] the robot snaps onto the target (including
/// its altitude, if set). Otherwise it steps along the bearing and eases
/// altitude toward the target at no more than [`MAX_CLIMB_RATE`].
pub fn navigate_toward_target(state: &mut MotionState, target: &Target, dt: f64) -> bool {
    let distance = haversine_distance(state.latitude, state.longitude, target.latitude, target.longitude);

    if distance < ARRIVAL_THRESHOLD_M {
        state.latitude = target.latitude;
        state.longitude = target.longitude;
        if let Some(altitude) = target.altitude {
            state.altitude = altitude;
        }
        return true;
    }

    let bearing = bearing_between(state.latitude, state.longitude, target.latitude, target.longitude);
    state.heading = bearing;
    let step = (state.speed * dt).min(distance);
    let dx = step * bearing.to_radians().sin();
    let dy = step * bearing.to_radians().cos();
    (state.latitude, state.longitude) = offset_coords(state.latitude, state.longitude, dx, dy);

    if let Some(altitude) = target.altitude {
        let diff = altitude - state.altitude;
        let climb = diff.abs().min(MAX_CLIMB_RATE * dt);
        state.altitude += climb.copysign(diff);
    }

    false
}

/// Drain above the floor, recharge below it (simulated battery swap)
fn cycle_battery(battery: f64, drain: f64, recharge: f64, dt: f64) -> f64 {
    if battery > BATTERY_FLOOR {
        (battery - drain * dt).max(BATTERY_FLOOR)
    } else {
        (battery + recharge * dt).min(100.0)
    }
}

/// Point on the curve offset `(dx, dy)` meters from the patrol center, with
/// heading taken from the direction of travel when the robot actually moved
fn follow_curve(state: &mut MotionState, config: &RobotConfig, dx: f64, dy: f64) {
    let (lat, lon) = offset_coords(config.start_lat, config.start_lon, dx, dy);
    let dlat = lat - state.latitude;
    let dlon = lon - state.longitude;
    if dlat.abs() > 1e-10 || dlon.abs() > 1e-10 {
        state.heading = dlon.atan2(dlat).to_degrees().rem_euclid(360.0);
    }
    state.latitude = lat;
    state.longitude = lon;
}

#[cfg(test)]
mod tests;
