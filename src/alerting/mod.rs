mod channels;
mod console_devices;
mod dispatcher;
mod push_notifier;
#[cfg(test)]
pub mod recording;

pub use channels::{ChannelError, Channels, Notification, Notifier, Permission, SoundDevice, SpeechDevice, VibrationDevice, VibrationPattern};
pub use console_devices::{ConsoleNotifier, ConsoleSound, ConsoleSpeech, ConsoleVibration};
pub use dispatcher::{Alert, AlertDispatcher, Delivery, DeliveryReport, DropReason};
pub use push_notifier::{PushClientError, PushNotifier, new_client};
