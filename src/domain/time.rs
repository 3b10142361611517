use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// A wall-clock time of day with minute resolution.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
}

impl Time {
    pub fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for Time {
    type Err = ParseTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = value.split_once(':').ok_or_else(|| ParseTimeError::Format(value.to_string()))?;

        let hour = hour.parse::<u8>().ok().filter(|hour| *hour <= 23).ok_or_else(|| ParseTimeError::Hour(hour.to_string()))?;

        // Minutes are always written with two digits
        let minute = Some(minute)
            .filter(|minute| minute.len() == 2)
            .and_then(|minute| minute.parse::<u8>().ok())
            .filter(|minute| *minute <= 59)
            .ok_or_else(|| ParseTimeError::Minute(minute.to_string()))?;

        Ok(Time { hour, minute })
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(Error::custom)
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum ParseTimeError {
    #[error("'{0}' is not a time in HH:MM format")]
    Format(String),
    #[error("'{0}' is not a valid hour between 0 and 23")]
    Hour(String),
    #[error("'{0}' is not a valid minute between 00 and 59")]
    Minute(String),
}
