use crate::domain::{SECONDS_PER_DAY, ScheduledAlarm};
use chrono::{NaiveTime, Timelike};
use tracing::{debug, info, instrument};

/// Scans the scheduled departure alarms on every tick and raises the first one that is due.
#[derive(Debug)]
pub struct AlarmChecker {
    alarms: Vec<ScheduledAlarm>,
}

impl AlarmChecker {
    pub fn new(alarms: Vec<ScheduledAlarm>) -> Self {
        AlarmChecker { alarms }
    }

    /// Raises at most one due alarm, in list order, and disables it so it does not fire again today.
    /// Alarms for which `is_pending` holds are still waiting for acknowledgment and are skipped.
    #[instrument(skip_all, fields(now = %now.format("%H:%M:%S")))]
    pub fn check(&mut self, now: NaiveTime, is_pending: impl Fn(&str) -> bool) -> Option<ScheduledAlarm> {
        let alarm = self
            .alarms
            .iter_mut()
            .filter(|alarm| alarm.enabled() && !is_pending(alarm.id()))
            .find(|alarm| is_due(alarm, now))?;

        alarm.set_enabled(false);
        info!("⏰ Alarm '{}' is due, departure at {}", alarm.label(), alarm.time());
        Some(alarm.clone())
    }

    /// Arms a fired alarm again for its next departure. Returns false for an unknown id.
    pub fn reenable(&mut self, id: &str) -> bool {
        let Some(alarm) = self.alarms.iter_mut().find(|alarm| alarm.id() == id) else {
            return false;
        };

        alarm.set_enabled(true);
        debug!("⏰ Alarm '{}' re-enabled", alarm.label());
        true
    }

    pub fn alarms(&self) -> &[ScheduledAlarm] {
        &self.alarms
    }
}

/// Due from `lead_time_minutes` before the departure until the departure minute has passed. The
/// window is measured on the 24 hour clock, so it may wrap past midnight.
fn is_due(alarm: &ScheduledAlarm, now: NaiveTime) -> bool {
    let lead_secs = alarm.lead_time_minutes() as u32 * 60;
    let trigger = (alarm.time().seconds_of_day() + SECONDS_PER_DAY - lead_secs) % SECONDS_PER_DAY;
    let since_trigger = (now.num_seconds_from_midnight() + SECONDS_PER_DAY - trigger) % SECONDS_PER_DAY;

    since_trigger < lead_secs + 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Time;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn alarm(id: &str, hour: u8, minute: u8, lead_time_minutes: u16) -> ScheduledAlarm {
        ScheduledAlarm::new(id.to_string(), Time { hour, minute }, format!("Train {}", id), lead_time_minutes).unwrap()
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    fn nothing_pending(_: &str) -> bool {
        false
    }

    #[test]
    fn raises_a_due_alarm_once() {
        let mut checker = AlarmChecker::new(vec![alarm("morning", 8, 0, 10)]);

        let raised = checker.check(at(7, 50, 0), nothing_pending);
        assert_eq!(raised.map(|alarm| alarm.id().to_string()), Some("morning".to_string()));
        assert!(!checker.alarms()[0].enabled());

        assert_eq!(checker.check(at(7, 55, 0), nothing_pending), None);
    }

    #[rstest]
    #[case::before_the_window(at(7, 49, 59), false)]
    #[case::window_opens(at(7, 50, 0), true)]
    #[case::departure_minute(at(8, 0, 59), true)]
    #[case::departed(at(8, 1, 0), false)]
    #[case::evening(at(20, 0, 0), false)]
    fn knows_when_an_alarm_is_due(#[case] now: NaiveTime, #[case] expected: bool) {
        assert_eq!(is_due(&alarm("morning", 8, 0, 10), now), expected);
    }

    #[rstest]
    #[case::before_midnight(at(23, 55, 0), true)]
    #[case::after_midnight(at(0, 3, 0), true)]
    #[case::departed(at(0, 6, 0), false)]
    #[case::previous_evening(at(23, 54, 0), false)]
    fn wraps_the_window_around_midnight(#[case] now: NaiveTime, #[case] expected: bool) {
        assert_eq!(is_due(&alarm("night", 0, 5, 10), now), expected);
    }

    #[test]
    fn raises_one_alarm_per_tick_in_list_order() {
        let mut checker = AlarmChecker::new(vec![alarm("first", 8, 0, 10), alarm("second", 8, 5, 15)]);

        let first = checker.check(at(7, 55, 0), nothing_pending);
        let second = checker.check(at(7, 55, 30), nothing_pending);
        let third = checker.check(at(7, 56, 0), nothing_pending);

        assert_eq!(first.map(|alarm| alarm.id().to_string()), Some("first".to_string()));
        assert_eq!(second.map(|alarm| alarm.id().to_string()), Some("second".to_string()));
        assert_eq!(third, None);
    }

    #[test]
    fn skips_alarms_awaiting_acknowledgment() {
        let mut checker = AlarmChecker::new(vec![alarm("morning", 8, 0, 10)]);

        assert_eq!(checker.check(at(7, 52, 0), |id| id == "morning"), None);
        assert!(checker.alarms()[0].enabled());
    }

    #[test]
    fn ignores_disabled_alarms() {
        let mut disabled = alarm("morning", 8, 0, 10);
        disabled.set_enabled(false);
        let mut checker = AlarmChecker::new(vec![disabled]);

        assert_eq!(checker.check(at(7, 52, 0), nothing_pending), None);
    }

    #[test]
    fn reenables_a_fired_alarm() {
        let mut checker = AlarmChecker::new(vec![alarm("morning", 8, 0, 10)]);
        checker.check(at(7, 50, 0), nothing_pending);

        assert!(checker.reenable("morning"));
        assert!(!checker.reenable("evening"));
        assert!(checker.alarms()[0].enabled());
    }
}
