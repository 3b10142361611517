use crate::alerting::{ChannelError, Channels, Notification, Notifier, Permission, SoundDevice, SpeechDevice, VibrationDevice, VibrationPattern};
use crate::domain::Ringtone;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, PartialEq, Debug)]
pub enum ChannelCall {
    PlayLooped(&'static str),
    StopSound,
    Vibrate(VibrationPattern),
    StopVibration,
    Speak(String),
    CancelSpeech,
    RequestPermission,
    Notify(Notification),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ChannelCall>,
    sound_playing: bool,
    vibrating: bool,
}

/// Fake devices that record every call, shared with the test through a cheap clone.
#[derive(Clone, Debug)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
    permission: Result<Permission, ()>,
    sound_blocked: bool,
    notifications_fail: bool,
    notification_delay: Option<Duration>,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder::with_permission(Ok(Permission::Granted))
    }
}

impl Recorder {
    pub fn with_permission(permission: Result<Permission, ()>) -> Self {
        Recorder {
            state: Arc::new(Mutex::new(State::default())),
            permission,
            sound_blocked: false,
            notifications_fail: false,
            notification_delay: None,
        }
    }

    pub fn with_blocked_sound(mut self) -> Self {
        self.sound_blocked = true;
        self
    }

    pub fn with_failing_notifications(mut self) -> Self {
        self.notifications_fail = true;
        self
    }

    /// Notifications take `delay` to complete
    pub fn with_slow_notifications(mut self, delay: Duration) -> Self {
        self.notification_delay = Some(delay);
        self
    }

    pub fn channels(&self) -> Channels {
        Channels {
            sound: Box::new(self.clone()),
            vibration: Box::new(self.clone()),
            speech: Box::new(self.clone()),
            notifier: Arc::new(self.clone()),
        }
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn sound_playing(&self) -> bool {
        self.state.lock().unwrap().sound_playing
    }

    pub fn vibrating(&self) -> bool {
        self.state.lock().unwrap().vibrating
    }

    fn record(&self, call: ChannelCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl SoundDevice for Recorder {
    fn play_looped(&self, ringtone: &Ringtone) -> Result<(), ChannelError> {
        if self.sound_blocked {
            return Err(ChannelError::Unsupported("audio"));
        }
        self.record(ChannelCall::PlayLooped(ringtone.id));
        self.state.lock().unwrap().sound_playing = true;
        Ok(())
    }

    fn stop(&self) {
        self.record(ChannelCall::StopSound);
        self.state.lock().unwrap().sound_playing = false;
    }
}

impl VibrationDevice for Recorder {
    fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), ChannelError> {
        self.record(ChannelCall::Vibrate(pattern.clone()));
        self.state.lock().unwrap().vibrating = true;
        Ok(())
    }

    fn stop(&self) {
        self.record(ChannelCall::StopVibration);
        self.state.lock().unwrap().vibrating = false;
    }
}

impl SpeechDevice for Recorder {
    fn speak(&self, text: &str) -> Result<(), ChannelError> {
        self.record(ChannelCall::Speak(text.to_string()));
        Ok(())
    }

    fn cancel(&self) {
        self.record(ChannelCall::CancelSpeech);
    }
}

#[async_trait]
impl Notifier for Recorder {
    async fn request_permission(&self) -> Result<Permission, ChannelError> {
        self.record(ChannelCall::RequestPermission);
        self.permission.map_err(|_| ChannelError::Unsupported("notifications"))
    }

    async fn notify(&self, notification: &Notification) -> Result<(), ChannelError> {
        self.record(ChannelCall::Notify(notification.clone()));
        if let Some(delay) = self.notification_delay {
            tokio::time::sleep(delay).await;
        }
        if self.notifications_fail {
            return Err(ChannelError::Rejected(500));
        }
        Ok(())
    }
}
