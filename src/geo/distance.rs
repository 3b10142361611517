use crate::domain::Coordinate;

/// Mean radius of the spherical earth approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Great-circle distance in meters using the haversine formula.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let a_latitude = a.latitude.to_radians();
    let b_latitude = b.latitude.to_radians();
    // The absolute deltas make the result bit-for-bit identical when swapping `a` and `b`
    let delta_latitude = (b.latitude - a.latitude).abs().to_radians();
    let delta_longitude = (b.longitude - a.longitude).abs().to_radians();

    let h = (delta_latitude / 2.0).sin().powi(2) + a_latitude.cos() * b_latitude.cos() * (delta_longitude / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from `a` towards `b` in degrees, between 0 (inclusive) and 360 (exclusive).
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let a_latitude = a.latitude.to_radians();
    let b_latitude = b.latitude.to_radians();
    let delta_longitude = (b.longitude - a.longitude).to_radians();

    let x = delta_longitude.sin() * b_latitude.cos();
    let y = a_latitude.cos() * b_latitude.sin() - a_latitude.sin() * b_latitude.cos() * delta_longitude.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Maps a bearing onto one of the eight principal winds.
pub fn compass_point(bearing: f64) -> &'static str {
    let index = (bearing.rem_euclid(360.0) / 45.0).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}
