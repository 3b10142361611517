use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// The sensory channels an alert is delivered through. All flags are independent.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize)]
pub struct AlertOptions {
    #[serde(default)]
    pub sound: bool,
    #[serde(default)]
    pub vibration: bool,
    #[serde(default)]
    pub voice: bool,
}

impl AlertOptions {
    pub fn is_silent(&self) -> bool {
        !self.sound && !self.vibration && !self.voice
    }
}

impl Display for AlertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_silent() {
            return write!(f, "silent");
        }

        let enabled = [(self.sound, "sound"), (self.vibration, "vibration"), (self.voice, "voice")]
            .into_iter()
            .filter_map(|(enabled, name)| enabled.then_some(name))
            .collect::<Vec<_>>();
        write!(f, "{}", enabled.join(", "))
    }
}
