// Great-circle helpers shared by the proximity scanner and robot navigation.

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance between two lat/lon points in meters (haversine).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2 in degrees (0 = north, 90 = east).
pub fn bearing_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlon = (lon2 - lon1).to_radians();
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Offset a lat/lon by `dx_m` meters east and `dy_m` meters north.
///
/// Flat-earth approximation, accurate for the few-hundred-meter offsets
/// used by patrol curves and per-tick navigation steps.
pub fn offset_coords(lat: f64, lon: f64, dx_m: f64, dy_m: f64) -> (f64, f64) {
    let new_lat = lat + (dy_m / EARTH_RADIUS_M).to_degrees();
    let new_lon = lon + (dx_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
    (new_lat, new_lon)
}

/// Round to a fixed number of decimal places (telemetry precision).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance(34.0522, -118.2437, 34.0522, -118.2437), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // One thousandth of a degree of latitude is ~111 m
        let d = haversine_distance(34.0, -118.0, 34.001, -118.0);
        assert!((d - 111.19).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_cardinal_bearings() {
        assert!((bearing_between(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((bearing_between(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-6);
        assert!((bearing_between(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-6);
        assert!((bearing_between(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_offset_matches_distance() {
        let (lat, lon) = offset_coords(34.0522, -118.2437, 30.0, 40.0);
        let d = haversine_distance(34.0522, -118.2437, lat, lon);
        assert!((d - 50.0).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(34.052212345678, 7), 34.0522123);
        assert_eq!(round_to(12.349, 1), 12.3);
        assert_eq!(round_to(-15.06, 1), -15.1);
    }
}
