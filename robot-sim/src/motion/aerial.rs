use super::{cycle_battery, MotionState, MotionStrategy};
use crate::config::RobotConfig;
use argus::geo::offset_coords;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

/// Drone: circular patrol with a gentle altitude bob
pub struct AerialMotion;

impl MotionStrategy for AerialMotion {
    fn patrol(&mut self, state: &mut MotionState, config: &RobotConfig) {
        let theta = state.phase;
        let dx = config.patrol_radius * theta.cos();
        let dy = config.patrol_radius * theta.sin();
        (state.latitude, state.longitude) = offset_coords(config.start_lat, config.start_lon, dx, dy);
        state.heading = (-theta.to_degrees()).rem_euclid(360.0);
        state.altitude = config.start_alt + 3.0 * (2.0 * theta).sin();
    }

    fn update_vitals(&mut self, state: &mut MotionState, dt: f64, rng: &mut dyn RngCore) {
        state.battery = cycle_battery(state.battery, 0.04, 0.5, dt);
        state.signal = (state.signal + rng.gen_range(-1.0..=1.0)).clamp(50.0, 100.0);
    }

    fn health_extras(&self, _state: &MotionState) -> Map<String, Value> {
        Map::new()
    }

    fn initial_signal(&self) -> f64 {
        95.0
    }
}
