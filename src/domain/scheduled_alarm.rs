use crate::domain::Time;
use serde::Deserialize;
use thiserror::Error;

const MAX_LEAD_TIME_MINUTES: u16 = 24 * 60 - 1;

/// A time-based departure reminder, raised `lead_time_minutes` before `time`.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(try_from = "SerializedAlarm")]
pub struct ScheduledAlarm {
    id: String,
    time: Time,
    label: String,
    lead_time_minutes: u16,
    enabled: bool,
}

#[derive(Deserialize)]
struct SerializedAlarm {
    id: String,
    time: Time,
    label: String,
    lead_time_minutes: u16,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ScheduledAlarm {
    pub fn new(id: String, time: Time, label: String, lead_time_minutes: u16) -> Result<Self, AlarmError> {
        if label.trim().is_empty() {
            return Err(AlarmError::EmptyLabel(id));
        }

        if !(1..=MAX_LEAD_TIME_MINUTES).contains(&lead_time_minutes) {
            return Err(AlarmError::InvalidLeadTime { id, lead_time_minutes });
        }

        Ok(ScheduledAlarm {
            id,
            time,
            label,
            lead_time_minutes,
            enabled: true,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn lead_time_minutes(&self) -> u16 {
        self.lead_time_minutes
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl TryFrom<SerializedAlarm> for ScheduledAlarm {
    type Error = AlarmError;

    fn try_from(serialized: SerializedAlarm) -> Result<Self, Self::Error> {
        let mut alarm = ScheduledAlarm::new(serialized.id, serialized.time, serialized.label, serialized.lead_time_minutes)?;
        alarm.enabled = serialized.enabled;
        Ok(alarm)
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum AlarmError {
    #[error("alarm '{0}' has an empty label")]
    EmptyLabel(String),
    #[error("alarm '{id}' has an invalid lead time of {lead_time_minutes} minutes, must be between 1 and 1439")]
    InvalidLeadTime { id: String, lead_time_minutes: u16 },
}
