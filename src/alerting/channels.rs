use crate::domain::Ringtone;
use async_trait::async_trait;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub trait SoundDevice: Debug + Send + Sync {
    /// Starts playing the ringtone in a loop until [`SoundDevice::stop`] is called.
    fn play_looped(&self, ringtone: &Ringtone) -> Result<(), ChannelError>;

    fn stop(&self);
}

pub trait VibrationDevice: Debug + Send + Sync {
    /// Vibrates with the pattern, repeating it if the pattern asks for it.
    fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), ChannelError>;

    fn stop(&self);
}

pub trait SpeechDevice: Debug + Send + Sync {
    fn speak(&self, text: &str) -> Result<(), ChannelError>;

    fn cancel(&self);
}

/// Delivers system-level notifications while the app is not visible.
#[async_trait]
pub trait Notifier: Debug + Send + Sync {
    async fn request_permission(&self) -> Result<Permission, ChannelError>;

    async fn notify(&self, notification: &Notification) -> Result<(), ChannelError>;
}

/// The devices an [`AlertDispatcher`](crate::alerting::AlertDispatcher) drives. Owned by the
/// dispatcher, only the notifier is shared with the tasks delivering background notifications.
#[derive(Debug)]
pub struct Channels {
    pub sound: Box<dyn SoundDevice>,
    pub vibration: Box<dyn VibrationDevice>,
    pub speech: Box<dyn SpeechDevice>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Permission {
    Unknown,
    Granted,
    Denied,
}

/// Alternating on and off durations, starting with on.
#[derive(Clone, PartialEq, Debug)]
pub struct VibrationPattern {
    pub pulses: Vec<Duration>,
    pub repeat_every: Option<Duration>,
}

#[cfg(test)]
impl VibrationPattern {
    pub fn once(pulses: Vec<Duration>) -> Self {
        VibrationPattern { pulses, repeat_every: None }
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        VibrationPattern {
            pulses: vec![Duration::from_millis(400), Duration::from_millis(200), Duration::from_millis(400)],
            repeat_every: Some(Duration::from_secs(1)),
        }
    }
}

impl Display for VibrationPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let pulses = self.pulses.iter().map(|pulse| pulse.as_millis().to_string()).collect::<Vec<_>>();
        write!(f, "[{}] ms", pulses.join(", "))?;
        if let Some(repeat_every) = self.repeat_every {
            write!(f, " every {:?}", repeat_every)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub sound: bool,
    pub vibrate: bool,
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("the notification service responded with status {0}")]
    Rejected(u16),
}

impl ChannelError {
    /// Whether trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChannelError::Request(error) => error.is_timeout() || error.is_connect(),
            ChannelError::Rejected(status) => *status == 429 || *status >= 500,
            ChannelError::Unsupported(_) => false,
        }
    }
}
