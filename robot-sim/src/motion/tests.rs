use super::*;
use argus::geo::haversine_distance;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn config(robot_type: RobotType, start_alt: f64) -> RobotConfig {
    RobotConfig {
        id: "test-001".to_string(),
        name: "Test".to_string(),
        robot_type,
        start_lat: 34.0522,
        start_lon: -118.2437,
        start_alt,
        start_heading: 0.0,
        patrol_radius: 200.0,
        max_speed: 5.0,
    }
}

fn state_at(config: &RobotConfig) -> MotionState {
    MotionState {
        latitude: config.start_lat,
        longitude: config.start_lon,
        altitude: config.start_alt,
        heading: 0.0,
        speed: config.max_speed,
        battery: 100.0,
        signal: 80.0,
        phase: 0.0,
    }
}

#[test]
fn test_navigation_steps_at_speed() {
    let cfg = config(RobotType::Drone, 50.0);
    let mut state = state_at(&cfg);
    // ~111 m north
    let target = Target {
        latitude: cfg.start_lat + 0.001,
        longitude: cfg.start_lon,
        altitude: None,
    };

    let arrived = navigate_toward_target(&mut state, &target, 1.0);
    assert!(!arrived);
    let moved = haversine_distance(cfg.start_lat, cfg.start_lon, state.latitude, state.longitude);
    assert!((moved - 5.0).abs() < 0.01);
    assert!(state.heading < 0.5 || state.heading > 359.5);
    assert_eq!(state.altitude, 50.0);
}

#[test]
fn test_navigation_snaps_inside_threshold() {
    let cfg = config(RobotType::Drone, 50.0);
    let mut state = state_at(&cfg);
    // ~3 m east
    let target = Target {
        latitude: cfg.start_lat,
        longitude: cfg.start_lon + 0.00003,
        altitude: Some(70.0),
    };

    assert!(navigate_toward_target(&mut state, &target, 0.5));
    assert_eq!(state.latitude, target.latitude);
    assert_eq!(state.longitude, target.longitude);
    assert_eq!(state.altitude, 70.0);
}

#[test]
fn test_navigation_eases_altitude() {
    let cfg = config(RobotType::Drone, 50.0);
    let mut state = state_at(&cfg);
    let target = Target {
        latitude: cfg.start_lat + 0.01,
        longitude: cfg.start_lon,
        altitude: Some(40.0),
    };

    navigate_toward_target(&mut state, &target, 0.5);
    assert!((state.altitude - 49.0).abs() < 1e-9);
}

#[test]
fn test_aerial_patrol_circle() {
    let cfg = config(RobotType::Drone, 50.0);
    let mut state = state_at(&cfg);
    let mut motion = AerialMotion;

    for i in 0..16 {
        state.phase = i as f64 * std::f64::consts::FRAC_PI_8;
        motion.patrol(&mut state, &cfg);
        let r = haversine_distance(cfg.start_lat, cfg.start_lon, state.latitude, state.longitude);
        assert!((r - cfg.patrol_radius).abs() < 0.5);
        assert!(state.altitude >= 47.0 && state.altitude <= 53.0);
        assert!((0.0..360.0).contains(&state.heading));
    }
}

#[test]
fn test_ground_patrol_stays_on_surface() {
    let cfg = config(RobotType::Ground, 0.0);
    let mut state = state_at(&cfg);
    let mut motion = GroundMotion::default();

    for i in 0..16 {
        state.phase = i as f64 * 0.4;
        motion.patrol(&mut state, &cfg);
        let r = haversine_distance(cfg.start_lat, cfg.start_lon, state.latitude, state.longitude);
        assert!(r <= cfg.patrol_radius + 0.5);
        assert_eq!(state.altitude, 0.0);
    }
}

#[test]
fn test_submersible_patrol_depth_band() {
    let cfg = config(RobotType::Underwater, -15.0);
    let mut state = state_at(&cfg);
    let mut motion = SubmersibleMotion;

    for i in 0..32 {
        state.phase = i as f64 * 0.4;
        motion.patrol(&mut state, &cfg);
        assert!(state.altitude <= -10.0 && state.altitude >= -20.0);
    }

    let extras = motion.health_extras(&state);
    let depth = extras["depth"].as_f64().unwrap();
    assert!((depth - state.altitude.abs()).abs() < 0.06);
    assert!(extras.contains_key("pressure_atm"));
}

#[test]
fn test_vitals_stay_in_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for robot_type in [RobotType::Drone, RobotType::Ground, RobotType::Underwater] {
        let cfg = config(robot_type, if robot_type == RobotType::Underwater { -15.0 } else { 0.0 });
        let mut state = state_at(&cfg);
        let mut motion = strategy_for(robot_type);
        state.signal = motion.initial_signal();

        for _ in 0..2000 {
            motion.update_vitals(&mut state, 0.5, &mut rng);
            assert!(state.battery >= 20.0 && state.battery <= 100.0);
            assert!(state.signal >= 10.0 && state.signal <= 100.0);
        }
    }
}

#[test]
fn test_battery_cycle() {
    assert!((cycle_battery(50.0, 0.04, 0.5, 1.0) - 49.96).abs() < 1e-9);
    assert_eq!(cycle_battery(20.01, 0.04, 0.5, 1.0), 20.0);
    assert_eq!(cycle_battery(20.0, 0.04, 0.5, 1.0), 20.5);
}

#[test]
fn test_ground_reports_wheel_speed() {
    let mut rng = StdRng::seed_from_u64(1);
    let cfg = config(RobotType::Ground, 0.0);
    let mut state = state_at(&cfg);
    let mut motion = GroundMotion::default();

    motion.update_vitals(&mut state, 0.5, &mut rng);
    let wheel = motion.health_extras(&state)["wheel_speed"].as_f64().unwrap();
    assert!((wheel - cfg.max_speed).abs() <= 0.25);
}
