/// A sound that can be looped while an alert awaits acknowledgment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Ringtone {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

const RINGTONES: [Ringtone; 3] = [
    Ringtone {
        id: "alarm-clock",
        name: "Alarm Clock",
        url: "https://actions.google.com/sounds/v1/alarms/alarm_clock.ogg",
    },
    Ringtone {
        id: "digital-watch",
        name: "Digital Watch",
        url: "https://actions.google.com/sounds/v1/alarms/digital_watch_alarm_long.ogg",
    },
    Ringtone {
        id: "medium-bell",
        name: "Medium Bell",
        url: "https://actions.google.com/sounds/v1/alarms/medium_bell_ringing_near.ogg",
    },
];

impl Ringtone {
    #[cfg(test)]
    pub fn all() -> &'static [Ringtone] {
        &RINGTONES
    }

    /// Returns the ringtone with the given id, or the first ringtone if the id is unknown.
    pub fn by_id(id: &str) -> Ringtone {
        RINGTONES.iter().find(|ringtone| ringtone.id == id).copied().unwrap_or(RINGTONES[0])
    }
}
