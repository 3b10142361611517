use crate::alarms::AlarmChecker;
use crate::alerting::{Alert, AlertDispatcher, Channels};
use crate::app_config::{AppConfig, Tracking};
use crate::domain::commands::{Command, TargetRef};
use crate::domain::events::Event;
use crate::domain::{AlertOptions, Place, Target};
use crate::geo;
use crate::tracking::{LadderError, ThresholdLadder, TrackingSession};
use chrono::{Local, NaiveTime};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, WeakSender};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

/// Owns all state of the service. Events are handled one at a time, each to completion.
#[derive(Debug)]
pub struct App {
    session: TrackingSession,
    dispatcher: AlertDispatcher,
    alarms: AlarmChecker,
    places: Vec<Place>,
    options: AlertOptions,
    visible: bool,
}

impl App {
    /// Background notifications report their outcome as an [`Event::Delivered`] through `reports`.
    pub fn new(config: &AppConfig, channels: Channels, reports: WeakSender<Event>) -> Result<Self, LadderError> {
        let ladder = ThresholdLadder::new(config.alerts().thresholds_m())?;
        let dispatcher = AlertDispatcher::new(channels, config.alerts().ringtone(), config.alerts().vibration(), reports);

        Ok(App {
            session: TrackingSession::new(ladder, config.tracking().reject_stale_fixes()),
            dispatcher,
            alarms: AlarmChecker::new(config.alarms().to_vec()),
            places: config.places().to_vec(),
            options: config.alerts().options(),
            visible: true,
        })
    }

    /// Handles events until a quit command arrives or every sender is gone, checking the alarms on
    /// every tick in between.
    #[instrument(skip_all)]
    pub async fn run(&mut self, mut rx: Receiver<Event>, tick: Duration) {
        let mut ticks = interval(tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        debug!("🔵 All event senders closed");
                        break;
                    };
                    if self.handle(event).is_break() {
                        break;
                    }
                }
                _ = ticks.tick() => self.tick(Local::now().time()),
            }
        }

        self.dispatcher.stop();
        info!("👋 Stopped");
    }

    /// Selects the configured initial target, and starts tracking it when autostart is on.
    pub fn select_initial_target(&mut self, tracking: &Tracking) {
        let Some(place) = tracking.initial_target() else {
            return;
        };
        if self.set_target(TargetRef::Place(place.to_string())) && tracking.autostart() {
            self.start_tracking();
        }
    }

    /// Never waits on a channel, so a slow notifier cannot hold up the events behind it.
    pub fn handle(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::PositionFix(fix) => {
                if let Some(event) = self.session.on_position_fix(&fix) {
                    self.dispatcher.dispatch(Alert::Proximity(event), self.options, self.visible);
                }
            }
            Event::PositionError(error) => self.session.on_position_error(error),
            Event::Command(command) => return self.execute(command),
            Event::Delivered(report) => {
                let delivery = self.dispatcher.on_delivery_report(report);
                debug!(?delivery, "📨 Background delivery finished");
            }
        }
        ControlFlow::Continue(())
    }

    /// Raises the first due departure alarm, if any.
    pub fn tick(&mut self, now: NaiveTime) {
        let dispatcher = &self.dispatcher;
        let is_pending = |id: &str| {
            dispatcher
                .active()
                .into_iter()
                .chain(dispatcher.queued())
                .any(|alert| matches!(alert, Alert::Departure(alarm) if alarm.id() == id))
        };

        if let Some(alarm) = self.alarms.check(now, is_pending) {
            self.dispatcher.dispatch(Alert::Departure(alarm), self.options, self.visible);
        }
    }

    fn execute(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SetTarget(target_ref) => {
                self.set_target(target_ref);
            }
            Command::ClearTarget => {
                self.dispatcher.cancel_proximity();
                self.session.clear_target();
            }
            Command::StartTracking => self.start_tracking(),
            Command::StopTracking => {
                self.session.stop_tracking();
                self.dispatcher.cancel_proximity();
            }
            Command::Acknowledge => {
                if self.dispatcher.acknowledge().is_none() {
                    debug!("✅ Nothing to acknowledge");
                }
            }
            Command::Visibility(visible) => {
                debug!(visible, "👁️ Visibility changed");
                self.visible = visible;
            }
            Command::Status => self.log_status(),
            Command::SetThresholds(distances) => {
                if let Err(e) = self.session.set_thresholds(&distances) {
                    warn!("⚠️ Unable to set the alert distances: {}", e);
                }
            }
            Command::SetOptions(options) => {
                info!("🔔 Alerting with {}", options);
                self.options = options;
            }
            Command::ClearPositionError => self.session.clear_position_error(),
            Command::ReenableAlarm(id) => {
                if !self.alarms.reenable(&id) {
                    warn!("⚠️ Unknown alarm '{}'", id);
                }
            }
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Returns whether the target was found and selected.
    fn set_target(&mut self, target_ref: TargetRef) -> bool {
        let Some(target) = self.resolve(target_ref) else {
            return false;
        };
        self.dispatcher.cancel_proximity();
        self.session.set_target(target);
        true
    }

    fn start_tracking(&mut self) {
        if let Err(e) = self.session.start_tracking() {
            warn!("⚠️ Unable to start tracking: {}", e);
        }
    }

    fn resolve(&self, target_ref: TargetRef) -> Option<Target> {
        match target_ref {
            TargetRef::Place(id) => {
                let place = self.places.iter().find(|place| place.id == id);
                if place.is_none() {
                    warn!("⚠️ Unknown place '{}'", id);
                }
                place.map(Target::from)
            }
            TargetRef::Coordinate { coordinate, name } => Some(Target::at(coordinate, name)),
        }
    }

    fn log_status(&self) {
        info!("📊 {}", self.session.status());
        info!("📊 Alerting with {}", self.options);

        let pending = self.session.ladder().pending().map(|threshold| geo::format_distance(threshold.distance_m())).collect::<Vec<_>>();
        info!("📊 Alert distances left: {}", if pending.is_empty() { "none".to_string() } else { pending.join(", ") });

        if let Some(alert) = self.dispatcher.active() {
            info!("📊 Awaiting acknowledgment: {}", alert.title());
        }

        for alarm in self.alarms.alarms() {
            let state = if alarm.enabled() { "armed" } else { "disabled" };
            info!("📊 Alarm '{}' at {} ({} min lead), {}", alarm.label(), alarm.time(), alarm.lead_time_minutes(), state);
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::recording::{ChannelCall, Recorder};
    use crate::alerting::{Notification, Permission};
    use crate::app_config::AppConfigBuilder;
    use crate::domain::{Coordinate, PositionError, PositionFix, ScheduledAlarm, Time};
    use crate::geo::EARTH_RADIUS_M;
    use crate::tracking::SessionState;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use test_log::test;
    use tokio::sync::mpsc::{self, Sender};

    fn station() -> Place {
        Place {
            id: "station".to_string(),
            name: "Central Station".to_string(),
            location: Coordinate::new(0.0, 0.0),
            reminder: Some("Take your bag.".to_string()),
        }
    }

    fn morning_train() -> ScheduledAlarm {
        ScheduledAlarm::new("morning".to_string(), Time { hour: 8, minute: 0 }, "Morning train".to_string(), 10).unwrap()
    }

    /// The app with its event channel. Background notifications report to the receiver.
    fn app(recorder: &Recorder) -> (App, Sender<Event>, Receiver<Event>) {
        let config = AppConfigBuilder::new().place(station()).alarm(morning_train()).build();
        let (tx, rx) = mpsc::channel(8);
        let app = App::new(&config, recorder.channels(), tx.downgrade()).unwrap();
        (app, tx, rx)
    }

    /// Handles an event that must not stop the app.
    fn feed(app: &mut App, event: Event) {
        assert!(app.handle(event).is_continue());
    }

    /// A fix due north of the station.
    fn fix_at(distance_m: f64) -> Event {
        let latitude = (distance_m / EARTH_RADIUS_M).to_degrees();
        Event::PositionFix(PositionFix::new(Coordinate::new(latitude, 0.0), Some(10.0), Utc::now()))
    }

    fn command(command: Command) -> Event {
        Event::Command(command)
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn track_station(app: &mut App) {
        feed(app, command(Command::SetTarget(TargetRef::Place("station".to_string()))));
        feed(app, command(Command::StartTracking));
    }

    #[test(tokio::test)]
    async fn alerts_when_approaching_the_target() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        track_station(&mut app);

        feed(&mut app, fix_at(2000.0));
        assert_eq!(recorder.calls(), vec![]);

        feed(&mut app, fix_at(900.0));
        assert!(recorder.sound_playing());
        assert!(recorder.vibrating());
        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Approaching Central Station!".to_string()));

        feed(&mut app, command(Command::Acknowledge));
        assert!(!recorder.sound_playing());
        assert!(!recorder.vibrating());
        assert_eq!(app.dispatcher().active(), None);
    }

    #[test(tokio::test)]
    async fn stopping_withdraws_the_proximity_alert() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        track_station(&mut app);
        feed(&mut app, fix_at(900.0));

        feed(&mut app, command(Command::StopTracking));

        assert_eq!(app.session().state(), SessionState::Armed);
        assert_eq!(app.dispatcher().active(), None);
        assert!(!recorder.sound_playing());
    }

    #[test(tokio::test)]
    async fn notifies_while_hidden() {
        let recorder = Recorder::default();
        let (mut app, _tx, mut rx) = app(&recorder);
        track_station(&mut app);

        feed(&mut app, command(Command::Visibility(false)));
        feed(&mut app, fix_at(450.0));
        let report = rx.recv().await.unwrap();
        feed(&mut app, report);

        assert_eq!(
            recorder.calls(),
            vec![
                ChannelCall::RequestPermission,
                ChannelCall::Notify(Notification {
                    title: "Approaching Central Station!".to_string(),
                    body: "You are within the 1.0 km radius of Central Station. Take your bag.".to_string(),
                    sound: true,
                    vibrate: true,
                })
            ]
        );
        assert_eq!(app.dispatcher().permission(), Permission::Granted);
    }

    #[test(tokio::test)]
    async fn a_slow_notifier_does_not_delay_acknowledging() {
        let recorder = Recorder::default().with_slow_notifications(Duration::from_secs(60));
        let (mut app, _tx, mut rx) = app(&recorder);
        track_station(&mut app);

        feed(&mut app, fix_at(900.0));
        assert!(recorder.sound_playing());

        feed(&mut app, command(Command::Visibility(false)));
        feed(&mut app, fix_at(400.0));
        feed(&mut app, command(Command::Acknowledge));

        assert!(!recorder.sound_playing());
        assert!(!recorder.vibrating());
        assert_eq!(app.dispatcher().active(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test(tokio::test)]
    async fn keeps_handling_events_while_a_notification_is_in_flight() {
        let recorder = Recorder::default().with_slow_notifications(Duration::from_secs(60));
        let (mut app, tx, rx) = app(&recorder);

        tx.send(command(Command::SetTarget(TargetRef::Place("station".to_string())))).await.unwrap();
        tx.send(command(Command::StartTracking)).await.unwrap();
        tx.send(command(Command::Visibility(false))).await.unwrap();
        tx.send(fix_at(900.0)).await.unwrap();
        tx.send(command(Command::Visibility(true))).await.unwrap();
        tx.send(fix_at(150.0)).await.unwrap();
        tx.send(command(Command::Acknowledge)).await.unwrap();
        tx.send(command(Command::Quit)).await.unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(1), app.run(rx, Duration::from_secs(3600))).await;

        assert!(finished.is_ok());
        assert_eq!(app.dispatcher().active(), None);
        assert!(recorder.calls().contains(&ChannelCall::PlayLooped("medium-bell")));
    }

    #[test(tokio::test)]
    async fn ignores_an_unknown_place() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);

        feed(&mut app, command(Command::SetTarget(TargetRef::Place("airport".to_string()))));

        assert_eq!(app.session().state(), SessionState::Idle);
    }

    #[test(tokio::test)]
    async fn tracks_an_ad_hoc_coordinate() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);

        let target = TargetRef::Coordinate {
            coordinate: Coordinate::new(0.0, 0.0),
            name: Some("Pier".to_string()),
        };
        feed(&mut app, command(Command::SetTarget(target)));
        feed(&mut app, command(Command::StartTracking));
        feed(&mut app, fix_at(150.0));

        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Approaching Pier!".to_string()));
    }

    #[test(tokio::test)]
    async fn starts_tracking_the_initial_target() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        let config = AppConfigBuilder::new().initial_target("station", true).build();

        app.select_initial_target(config.tracking());

        assert_eq!(app.session().state(), SessionState::Tracking);
    }

    #[test(tokio::test)]
    async fn only_arms_the_initial_target_without_autostart() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        let config = AppConfigBuilder::new().initial_target("station", false).build();

        app.select_initial_target(config.tracking());

        assert_eq!(app.session().state(), SessionState::Armed);
    }

    #[test(tokio::test)]
    async fn skips_an_unknown_initial_target() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        let config = AppConfigBuilder::new().initial_target("airport", true).build();

        app.select_initial_target(config.tracking());

        assert_eq!(app.session().state(), SessionState::Idle);
    }

    #[test(tokio::test)]
    async fn refuses_to_track_until_the_position_error_is_cleared() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        feed(&mut app, Event::PositionError(PositionError::PermissionDenied));

        track_station(&mut app);
        assert_eq!(app.session().state(), SessionState::Armed);

        feed(&mut app, command(Command::ClearPositionError));
        feed(&mut app, command(Command::StartTracking));
        assert_eq!(app.session().state(), SessionState::Tracking);
    }

    #[test(tokio::test)]
    async fn silent_options_present_without_channels() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        track_station(&mut app);

        feed(&mut app, command(Command::SetOptions(AlertOptions::default())));
        feed(&mut app, fix_at(900.0));

        assert_eq!(recorder.calls(), vec![]);
        assert!(app.dispatcher().active().is_some());
    }

    #[test(tokio::test)]
    async fn raises_a_departure_alarm_once() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);

        app.tick(at(7, 50));
        app.tick(at(7, 55));

        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Morning train".to_string()));
        assert_eq!(app.dispatcher().queued().count(), 0);

        feed(&mut app, command(Command::Acknowledge));
        app.tick(at(7, 56));
        assert_eq!(app.dispatcher().active(), None);
    }

    #[test(tokio::test)]
    async fn reenabled_alarms_fire_again() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        app.tick(at(7, 50));
        feed(&mut app, command(Command::Acknowledge));

        feed(&mut app, command(Command::ReenableAlarm("morning".to_string())));
        app.tick(at(7, 58));

        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Morning train".to_string()));
    }

    #[test(tokio::test)]
    async fn queues_a_proximity_alert_behind_a_departure_alarm() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);
        track_station(&mut app);

        app.tick(at(7, 50));
        feed(&mut app, fix_at(900.0));
        assert_eq!(app.dispatcher().queued().count(), 1);

        feed(&mut app, command(Command::Acknowledge));
        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Approaching Central Station!".to_string()));
    }

    #[test(tokio::test)]
    async fn changing_the_target_keeps_the_departure_alarm() {
        let recorder = Recorder::default();
        let (mut app, _tx, _rx) = app(&recorder);

        app.tick(at(7, 50));
        feed(&mut app, command(Command::ClearTarget));

        assert_eq!(app.dispatcher().active().map(Alert::title), Some("Morning train".to_string()));
    }

    #[test(tokio::test)]
    async fn runs_until_quit() {
        let recorder = Recorder::default();
        let (mut app, tx, rx) = app(&recorder);

        tx.send(command(Command::SetTarget(TargetRef::Place("station".to_string())))).await.unwrap();
        tx.send(command(Command::StartTracking)).await.unwrap();
        tx.send(fix_at(900.0)).await.unwrap();
        tx.send(command(Command::Quit)).await.unwrap();

        app.run(rx, Duration::from_secs(3600)).await;

        assert_eq!(app.session().state(), SessionState::Tracking);
        assert!(!recorder.sound_playing());
    }

    #[test(tokio::test)]
    async fn stops_when_every_sender_is_gone() {
        let recorder = Recorder::default();
        let (mut app, tx, rx) = app(&recorder);
        drop(tx);

        app.run(rx, Duration::from_secs(3600)).await;

        assert_eq!(app.session().state(), SessionState::Idle);
    }
}
