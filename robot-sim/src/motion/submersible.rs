use super::{cycle_battery, follow_curve, MotionState, MotionStrategy};
use crate::config::RobotConfig;
use argus::geo::round_to;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

/// Underwater robot: 1.5:1 elliptical patrol with a slow depth oscillation.
///
/// Signal degrades with depth; pressure is reported at 0.1 atm per meter.
pub struct SubmersibleMotion;

impl MotionStrategy for SubmersibleMotion {
    fn patrol(&mut self, state: &mut MotionState, config: &RobotConfig) {
        let theta = state.phase;
        let dx = config.patrol_radius * 1.5 * theta.cos();
        let dy = config.patrol_radius * theta.sin();
        follow_curve(state, config, dx, dy);
        let depth = config.start_alt.abs() + 5.0 * (theta * 0.5).sin();
        state.altitude = -depth;
    }

    fn update_vitals(&mut self, state: &mut MotionState, dt: f64, rng: &mut dyn RngCore) {
        state.battery = cycle_battery(state.battery, 0.03, 0.4, dt);
        let base = (80.0 - state.altitude.abs() * 0.5).max(20.0);
        state.signal = (base + rng.gen_range(-2.0..=2.0)).clamp(10.0, 100.0);
    }

    fn health_extras(&self, state: &MotionState) -> Map<String, Value> {
        let depth = state.altitude.abs();
        let mut extras = Map::new();
        extras.insert("depth".to_string(), json!(round_to(depth, 1)));
        extras.insert("pressure_atm".to_string(), json!(round_to(depth * 0.1, 2)));
        extras
    }

    fn initial_signal(&self) -> f64 {
        60.0
    }
}
