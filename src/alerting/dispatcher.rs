use crate::alerting::{Channels, Notification, Notifier, Permission, VibrationPattern};
use crate::domain::events::Event;
use crate::domain::{AlertOptions, Ringtone, ScheduledAlarm};
use crate::geo;
use crate::tracking::AlertEvent;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::WeakSender;
use tracing::{debug, info, instrument, warn};

#[derive(Clone, PartialEq, Debug)]
pub enum Alert {
    Proximity(AlertEvent),
    Departure(ScheduledAlarm),
}

impl Alert {
    pub fn is_proximity(&self) -> bool {
        matches!(self, Alert::Proximity(_))
    }

    pub fn title(&self) -> String {
        match self {
            Alert::Proximity(event) => format!("Approaching {}!", event.target.display_name()),
            Alert::Departure(alarm) => alarm.label().to_string(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Alert::Proximity(event) => {
                let body = format!(
                    "You are within the {} radius of {}.",
                    geo::format_distance(event.threshold.distance_m()),
                    event.target.display_name()
                );
                match event.target.reminder() {
                    Some(reminder) => format!("{} {}", body, reminder),
                    None => body,
                }
            }
            Alert::Departure(alarm) => format!(
                "Departure at {}, reminder set for {} minute{} before.",
                alarm.time(),
                alarm.lead_time_minutes(),
                if alarm.lead_time_minutes() > 1 { "s" } else { "" }
            ),
        }
    }

    /// The sentence spoken when voice alerts are enabled.
    pub fn announcement(&self) -> String {
        match self {
            Alert::Proximity(event) => format!(
                "You are within {:.0} meters of {}.",
                event.threshold.distance_m(),
                event.target.display_name()
            ),
            Alert::Departure(alarm) => format!("{} departs at {}.", alarm.label(), alarm.time()),
        }
    }
}

/// How [`AlertDispatcher::dispatch`] handled an alert.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Delivery {
    /// Shown in the app, channels running until acknowledged
    Presented,
    /// Waiting for the presented alert to be acknowledged
    Queued,
    /// Handed to the notifier, the outcome arrives later as an [`Event::Delivered`]
    Notifying,
    Notified,
    Dropped(DropReason),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DropReason {
    PermissionDenied,
    NotificationFailed,
}

#[derive(Debug)]
struct PendingAlert {
    alert: Alert,
    options: AlertOptions,
}

/// The outcome of a background notification, fed back into the dispatcher through
/// [`AlertDispatcher::on_delivery_report`].
#[derive(Debug)]
pub struct DeliveryReport {
    pending: PendingAlert,
    /// The answer to a permission request made for this alert
    permission: Option<Permission>,
    result: Result<(), DropReason>,
}

/// Delivers alerts through the sensory channels.
///
/// At most one alert is presented in the app at a time. Foreground alerts that arrive while another
/// one awaits acknowledgment are queued in arrival order.
#[derive(Debug)]
pub struct AlertDispatcher {
    channels: Channels,
    ringtone: Ringtone,
    vibration: VibrationPattern,
    permission: Permission,
    active: Option<PendingAlert>,
    queue: VecDeque<PendingAlert>,
    reports: WeakSender<Event>,
}

impl AlertDispatcher {
    /// Background notifications report back through `reports`. The sender is weak, so the dispatcher
    /// does not keep the event channel open on its own.
    pub fn new(channels: Channels, ringtone: Ringtone, vibration: VibrationPattern, reports: WeakSender<Event>) -> Self {
        AlertDispatcher {
            channels,
            ringtone,
            vibration,
            permission: Permission::Unknown,
            active: None,
            queue: VecDeque::new(),
            reports,
        }
    }

    #[instrument(skip_all, fields(alert = alert.title(), foreground = is_foreground))]
    pub fn dispatch(&mut self, alert: Alert, options: AlertOptions, is_foreground: bool) -> Delivery {
        let pending = PendingAlert { alert, options };
        if !is_foreground {
            return self.deliver_in_background(pending);
        }

        if self.active.is_some() {
            debug!("🔕 Another alert awaits acknowledgment, queueing '{}'", pending.alert.title());
            self.queue.push_back(pending);
            return Delivery::Queued;
        }

        self.present(pending);
        Delivery::Presented
    }

    /// Acknowledges the presented alert, stopping all channels, and presents the next queued alert.
    pub fn acknowledge(&mut self) -> Option<Alert> {
        let acknowledged = self.active.take()?;
        self.stop();
        info!("✅ Alert '{}' acknowledged", acknowledged.alert.title());

        if let Some(next) = self.queue.pop_front() {
            self.present(next);
        }

        Some(acknowledged.alert)
    }

    /// Withdraws every proximity alert, presented or queued. Returns the number of alerts withdrawn.
    pub fn cancel_proximity(&mut self) -> usize {
        let queued = self.queue.len();
        self.queue.retain(|pending| !pending.alert.is_proximity());
        let mut cancelled = queued - self.queue.len();

        if self.active.as_ref().is_some_and(|pending| pending.alert.is_proximity()) {
            self.active = None;
            self.stop();
            cancelled += 1;

            if let Some(next) = self.queue.pop_front() {
                self.present(next);
            }
        }

        if cancelled > 0 {
            info!("🔕 Withdrew {} proximity alert(s)", cancelled);
        }
        cancelled
    }

    /// Halts sound, vibration and speech. Safe to call at any time.
    pub fn stop(&self) {
        self.channels.sound.stop();
        self.channels.vibration.stop();
        self.channels.speech.cancel();
    }

    pub fn active(&self) -> Option<&Alert> {
        self.active.as_ref().map(|pending| &pending.alert)
    }

    pub fn queued(&self) -> impl Iterator<Item = &Alert> {
        self.queue.iter().map(|pending| &pending.alert)
    }

    #[cfg(test)]
    pub fn permission(&self) -> Permission {
        self.permission
    }

    fn present(&mut self, pending: PendingAlert) {
        info!(options = %pending.options, "🚨 {} {}", pending.alert.title(), pending.alert.body());
        let options = pending.options;

        // A failing channel must not keep the others from running
        if options.sound {
            if let Err(e) = self.channels.sound.play_looped(&self.ringtone) {
                warn!("⚠️ Unable to play '{}': {}", self.ringtone.name, e);
            }
        }

        if options.vibration {
            if let Err(e) = self.channels.vibration.vibrate(&self.vibration) {
                warn!("⚠️ Unable to vibrate: {}", e);
            }
        }

        if options.voice {
            self.announce(&pending.alert);
        }

        self.active = Some(pending);
    }

    /// Never waits for the notifier. Permission and notification are handled by a spawned task that
    /// reports back with an [`Event::Delivered`].
    fn deliver_in_background(&mut self, pending: PendingAlert) -> Delivery {
        if self.permission == Permission::Denied {
            debug!("🔕 Dropping '{}', notifications are not permitted", pending.alert.title());
            return Delivery::Dropped(DropReason::PermissionDenied);
        }

        let Some(reports) = self.reports.upgrade() else {
            debug!("🔕 Dropping '{}', the app is shutting down", pending.alert.title());
            return Delivery::Dropped(DropReason::NotificationFailed);
        };

        let notifier = Arc::clone(&self.channels.notifier);
        let permission = self.permission;
        tokio::spawn(async move {
            let report = notify(notifier.as_ref(), permission, pending).await;
            if reports.send(Event::Delivered(report)).await.is_err() {
                debug!("🔕 Delivery report dropped, the app has stopped");
            }
        });
        Delivery::Notifying
    }

    /// Records the permission learned for a background alert and speaks its announcement unless the
    /// notification was not permitted.
    pub fn on_delivery_report(&mut self, report: DeliveryReport) -> Delivery {
        if let Some(permission) = report.permission {
            if self.permission == Permission::Unknown {
                info!(?permission, "🔐 Notification permission recorded");
                self.permission = permission;
            }
        }

        let pending = report.pending;
        if pending.options.voice && report.result != Err(DropReason::PermissionDenied) {
            self.announce(&pending.alert);
        }

        match report.result {
            Ok(()) => Delivery::Notified,
            Err(reason) => Delivery::Dropped(reason),
        }
    }

    fn announce(&self, alert: &Alert) {
        if let Err(e) = self.channels.speech.speak(&alert.announcement()) {
            warn!("⚠️ Unable to speak the announcement: {}", e);
        }
    }
}

/// Asks for permission while it is unknown, then shows the notification if permitted. A failed
/// request leaves the permission unknown so the next alert asks again.
async fn notify(notifier: &dyn Notifier, permission: Permission, pending: PendingAlert) -> DeliveryReport {
    let mut learned = None;
    let permission = match permission {
        Permission::Unknown => {
            debug!("🔐 Requesting notification permission...");
            match notifier.request_permission().await {
                Ok(permission) => {
                    info!(?permission, "🔐 Requesting notification permission... OK");
                    learned = Some(permission);
                    permission
                }
                Err(e) => {
                    warn!("🔐 Requesting notification permission... failed, {}", e);
                    Permission::Unknown
                }
            }
        }
        known => known,
    };

    if permission != Permission::Granted {
        debug!("🔕 Dropping '{}', notifications are not permitted", pending.alert.title());
        return DeliveryReport {
            pending,
            permission: learned,
            result: Err(DropReason::PermissionDenied),
        };
    }

    let notification = Notification {
        title: pending.alert.title(),
        body: pending.alert.body(),
        sound: pending.options.sound,
        vibrate: pending.options.vibration,
    };

    let result = match notifier.notify(&notification).await {
        Ok(()) => {
            info!("📨 Notified '{}'", notification.title);
            Ok(())
        }
        Err(e) => {
            warn!("⚠️ Unable to show notification '{}': {}", notification.title, e);
            Err(DropReason::NotificationFailed)
        }
    };

    DeliveryReport {
        pending,
        permission: learned,
        result,
    }
}

impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
