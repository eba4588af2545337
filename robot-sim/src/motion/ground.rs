use super::{cycle_battery, follow_curve, MotionState, MotionStrategy};
use crate::config::RobotConfig;
use argus::geo::round_to;
use rand::{Rng, RngCore};
use serde_json::{json, Map, Value};

/// Ground robot: figure-eight patrol on the surface
#[derive(Default)]
pub struct GroundMotion {
    wheel_speed: f64,
}

impl MotionStrategy for GroundMotion {
    fn patrol(&mut self, state: &mut MotionState, config: &RobotConfig) {
        let theta = state.phase;
        let r = (config.patrol_radius * (2.0 * theta).cos()).abs();
        follow_curve(state, config, r * theta.cos(), r * theta.sin());
        state.altitude = 0.0;
    }

    fn update_vitals(&mut self, state: &mut MotionState, dt: f64, rng: &mut dyn RngCore) {
        self.wheel_speed = state.speed + rng.gen_range(-0.2..=0.2);
        state.battery = cycle_battery(state.battery, 0.02, 0.3, dt);
        state.signal = (state.signal + rng.gen_range(-0.5..=0.5)).clamp(60.0, 100.0);
    }

    fn health_extras(&self, _state: &MotionState) -> Map<String, Value> {
        let mut extras = Map::new();
        extras.insert("wheel_speed".to_string(), json!(round_to(self.wheel_speed, 1)));
        extras
    }

    fn initial_signal(&self) -> f64 {
        90.0
    }
}
