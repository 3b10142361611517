use crate::alerting::VibrationPattern;
use crate::domain::{AlertOptions, Place, Ringtone, ScheduledAlarm};
use config::{Config, ConfigError};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    alerts: Alerts,
    tracking: Tracking,
    #[serde(default)]
    position: Position,
    notifications: Notifications,
    #[serde(default)]
    places: Vec<Place>,
    #[serde(default)]
    alarms: Vec<ScheduledAlarm>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("NEARSTOP").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn alerts(&self) -> &Alerts {
        &self.alerts
    }

    pub fn tracking(&self) -> &Tracking {
        &self.tracking
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn alarms(&self) -> &[ScheduledAlarm] {
        &self.alarms
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    event_buffer_size: usize,
    #[serde(deserialize_with = "deserialize_level")]
    log_level: Level,
    #[serde(with = "humantime_serde")]
    alarm_tick: Duration,
}

impl Core {
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }

    pub fn alarm_tick(&self) -> Duration {
        self.alarm_tick
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(Error::custom)
}

#[derive(Debug, Deserialize)]
pub struct Alerts {
    thresholds_m: Vec<f64>,
    #[serde(default)]
    options: AlertOptions,
    #[serde(default)]
    ringtone: String,
    vibration: Vibration,
}

#[derive(Debug, Deserialize)]
struct Vibration {
    pulses_ms: Vec<u64>,
    #[serde(default, with = "humantime_serde")]
    repeat_every: Option<Duration>,
}

impl Alerts {
    pub fn thresholds_m(&self) -> &[f64] {
        &self.thresholds_m
    }

    pub fn options(&self) -> AlertOptions {
        self.options
    }

    /// The configured ringtone, or the first of the catalog when none or an unknown one is configured.
    pub fn ringtone(&self) -> Ringtone {
        Ringtone::by_id(&self.ringtone)
    }

    pub fn vibration(&self) -> VibrationPattern {
        VibrationPattern {
            pulses: self.vibration.pulses_ms.iter().copied().map(Duration::from_millis).collect(),
            repeat_every: self.vibration.repeat_every,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Tracking {
    #[serde(default)]
    reject_stale_fixes: bool,
    #[serde(default)]
    initial_target: Option<String>,
    #[serde(default)]
    autostart: bool,
}

impl Tracking {
    pub fn reject_stale_fixes(&self) -> bool {
        self.reject_stale_fixes
    }

    /// Id of the saved place to select on startup
    pub fn initial_target(&self) -> Option<&str> {
        self.initial_target.as_deref()
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }
}

#[derive(Debug, Deserialize)]
pub struct Position {
    #[serde(default)]
    replay_file: Option<PathBuf>,
    #[serde(default = "realtime")]
    speedup: f64,
}

fn realtime() -> f64 {
    1.0
}

impl Default for Position {
    fn default() -> Self {
        Position {
            replay_file: None,
            speedup: realtime(),
        }
    }
}

impl Position {
    pub fn replay_file(&self) -> Option<&PathBuf> {
        self.replay_file.as_ref()
    }

    pub fn speedup(&self) -> f64 {
        self.speedup
    }
}

#[derive(Debug, Deserialize)]
pub struct Notifications {
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    retry_ms: u64,
    #[serde(with = "humantime_serde")]
    retry_max_delay: Duration,
    retry_attempts: usize,
}

impl Notifications {
    /// The push server and topic, only when both are configured.
    pub fn push_topic(&self) -> Option<(&str, &str)> {
        Some((self.server.as_deref()?, self.topic.as_deref()?))
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        self.retry_max_delay
    }

    /// Attempts in total, including the first one
    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core {
                    event_buffer_size: 16,
                    log_level: Level::DEBUG,
                    alarm_tick: Duration::from_secs(15),
                },
                alerts: Alerts {
                    thresholds_m: vec![1000.0, 500.0, 200.0],
                    options: AlertOptions {
                        sound: true,
                        vibration: true,
                        voice: false,
                    },
                    ringtone: "medium-bell".to_string(),
                    vibration: Vibration {
                        pulses_ms: vec![400, 200, 400],
                        repeat_every: Some(Duration::from_secs(1)),
                    },
                },
                tracking: Tracking {
                    reject_stale_fixes: false,
                    initial_target: None,
                    autostart: false,
                },
                position: Position::default(),
                notifications: Notifications {
                    server: None,
                    topic: None,
                    access_token: None,
                    retry_ms: 1,
                    retry_max_delay: Duration::from_millis(5),
                    retry_attempts: 3,
                },
                places: vec![],
                alarms: vec![],
            },
        }
    }

    pub fn thresholds(mut self, thresholds_m: Vec<f64>) -> Self {
        self.config.alerts.thresholds_m = thresholds_m;
        self
    }

    pub fn initial_target(mut self, place: &str, autostart: bool) -> Self {
        self.config.tracking.initial_target = Some(place.to_string());
        self.config.tracking.autostart = autostart;
        self
    }

    pub fn place(mut self, place: Place) -> Self {
        self.config.places.push(place);
        self
    }

    pub fn alarm(mut self, alarm: ScheduledAlarm) -> Self {
        self.config.alarms.push(alarm);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
