use crate::alerting::{ChannelError, Notification, Notifier, Permission, SoundDevice, SpeechDevice, VibrationDevice, VibrationPattern};
use crate::domain::Ringtone;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

/// Devices for a headless host: every alert is written to the log.
#[derive(Debug, Default)]
pub struct ConsoleSound {
    playing: Mutex<Option<&'static str>>,
}

impl SoundDevice for ConsoleSound {
    fn play_looped(&self, ringtone: &Ringtone) -> Result<(), ChannelError> {
        let mut playing = self.playing.lock().unwrap_or_else(PoisonError::into_inner);
        if *playing != Some(ringtone.id) {
            info!(url = ringtone.url, "🔔 Looping '{}'", ringtone.name);
            *playing = Some(ringtone.id);
        }
        Ok(())
    }

    fn stop(&self) {
        if let Some(id) = self.playing.lock().unwrap_or_else(PoisonError::into_inner).take() {
            debug!("🔔 Stopped '{}'", id);
        }
    }
}

#[cfg(test)]
impl ConsoleSound {
    pub fn playing(&self) -> Option<&'static str> {
        *self.playing.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub struct ConsoleVibration {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl VibrationDevice for ConsoleVibration {
    fn vibrate(&self, pattern: &VibrationPattern) -> Result<(), ChannelError> {
        self.stop();

        let Some(repeat_every) = pattern.repeat_every else {
            info!("📳 Vibrating {}", pattern);
            return Ok(());
        };

        let handle = Handle::try_current().map_err(|_| ChannelError::Unsupported("repeating vibration"))?;
        let pattern = pattern.clone();
        let task = handle.spawn(async move {
            let mut ticks = interval(repeat_every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                info!("📳 Vibrating {}", pattern);
            }
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        Ok(())
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
            debug!("📳 Vibration stopped");
        }
    }
}

#[cfg(test)]
impl ConsoleVibration {
    pub fn is_repeating(&self) -> bool {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[derive(Debug, Default)]
pub struct ConsoleSpeech;

impl SpeechDevice for ConsoleSpeech {
    fn speak(&self, text: &str) -> Result<(), ChannelError> {
        info!("🗣️ \"{}\"", text);
        Ok(())
    }

    fn cancel(&self) {}
}

/// Writes notifications to the log. The console is always allowed to show them.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn request_permission(&self) -> Result<Permission, ChannelError> {
        Ok(Permission::Granted)
    }

    async fn notify(&self, notification: &Notification) -> Result<(), ChannelError> {
        info!(sound = notification.sound, vibrate = notification.vibrate, "📨 {}: {}", notification.title, notification.body);
        Ok(())
    }
}
