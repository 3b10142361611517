mod distance;
mod eta;

pub use distance::{EARTH_RADIUS_M, bearing, compass_point, distance, format_distance};
pub use eta::{MIN_MOVING_SPEED, arrival_time, eta, format_eta};
