use crate::domain::Coordinate;
use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, Debug)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub speed: Option<f64>, // In meters per second
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    /// Creates a fix, discarding a speed that is negative or not a number. Such readings come from
    /// sensors that cannot measure speed and carry no information.
    pub fn new(coordinate: Coordinate, speed: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        PositionFix {
            coordinate,
            speed: speed.filter(|speed| speed.is_finite() && *speed >= 0.0),
            timestamp,
        }
    }
}
