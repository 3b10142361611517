pub mod commands;
pub mod events;
mod alert_options;
mod coordinate;
mod place;
mod position_error;
mod position_fix;
mod ringtone;
mod scheduled_alarm;
mod target;
mod time;

pub use alert_options::AlertOptions;
pub use coordinate::{Coordinate, InvalidCoordinate};
pub use place::Place;
pub use position_error::PositionError;
pub use position_fix::PositionFix;
pub use ringtone::Ringtone;
pub use scheduled_alarm::{AlarmError, ScheduledAlarm};
pub use target::Target;
pub use time::{ParseTimeError, SECONDS_PER_DAY, Time};
