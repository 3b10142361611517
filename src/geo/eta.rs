use chrono::{DateTime, TimeZone};
use std::time::Duration;

/// Speeds at or below this value are treated as standing still.
pub const MIN_MOVING_SPEED: f64 = 1.0;

/// Projects the time to cover `distance_m` at `speed` meters per second. There is no estimate when
/// the speed is unknown or too low to be distinguished from noise.
pub fn eta(distance_m: f64, speed: Option<f64>) -> Option<Duration> {
    let speed = speed.filter(|speed| speed.is_finite() && *speed > MIN_MOVING_SPEED)?;
    if !distance_m.is_finite() || distance_m < 0.0 {
        return None;
    }

    Duration::try_from_secs_f64(distance_m / speed).ok()
}

/// Formats a duration as whole minutes, or hours and minutes from one hour on.
pub fn format_eta(eta: Duration) -> String {
    let minutes = eta.as_secs() / 60;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

/// The wall-clock time of arrival as HH:MM in the timezone of `now`.
pub fn arrival_time<Tz: TimeZone>(now: DateTime<Tz>, eta: Duration) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let arrival = chrono::Duration::from_std(eta).ok().and_then(|eta| now.clone().checked_add_signed(eta)).unwrap_or(now);
    arrival.format("%H:%M").to_string()
}
