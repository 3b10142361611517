use crate::alerting::{Channels, ConsoleNotifier, ConsoleSound, ConsoleSpeech, ConsoleVibration, Notifier, PushClientError, PushNotifier};
use crate::app::App;
use crate::app_config::AppConfig;
use crate::console::read_commands;
use crate::domain::events::Event;
use crate::position::ReplaySource;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

mod alarms;
mod alerting;
mod app;
mod app_config;
mod console;
mod coordinate_deserializer;
mod domain;
mod geo;
mod position;
mod tracking;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    tracing_subscriber::fmt().with_max_level(config.core().log_level()).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("✅  Loaded configuration");

    let (tx, rx) = mpsc::channel::<Event>(config.core().event_buffer_size());

    let channels = build_channels(&config)?;
    let mut app = App::new(&config, channels, tx.downgrade())?;
    info!("✅  Initialized alerting");

    app.select_initial_target(config.tracking());

    let subscription = config.position().replay_file().map(|path| {
        let source = ReplaySource {
            path: path.clone(),
            speedup: config.position().speedup(),
        };
        info!("✅  Replaying positions from {}", path.display());
        position::subscribe(source, tx.clone())
    });

    task::spawn(read_commands(tokio::io::stdin(), tx));
    info!("✅  Listening for commands");

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));
    app.run(rx, config.core().alarm_tick()).await;

    if let Some(subscription) = subscription {
        subscription.unsubscribe();
    }
    Ok(())
}

fn build_channels(config: &AppConfig) -> Result<Channels, PushClientError> {
    let notifier: Arc<dyn Notifier> = match config.notifications().push_topic() {
        Some((server, topic)) => {
            let client = alerting::new_client(config.notifications().access_token())?;
            info!("📨 Publishing notifications to topic '{}' on {}", topic, server);
            Arc::new(PushNotifier::new(client, server, topic, config.notifications()))
        }
        None => Arc::new(ConsoleNotifier),
    };

    Ok(Channels {
        sound: Box::new(ConsoleSound::default()),
        vibration: Box::new(ConsoleVibration::default()),
        speech: Box::new(ConsoleSpeech),
        notifier,
    })
}
