use crate::domain::{PositionError, PositionFix, Target};
use crate::geo;
use crate::tracking::{AlertThreshold, LadderError, ThresholdLadder};
use chrono::{DateTime, Local, Utc};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    /// No target
    Idle,
    /// Target set, not consuming fixes
    Armed,
    Tracking,
}

/// A threshold that was crossed on the way to `target`.
#[derive(Clone, PartialEq, Debug)]
pub struct AlertEvent {
    pub threshold: AlertThreshold,
    pub target: Target,
    pub distance_m: f64,
}

/// The single tracking session of the process.
///
/// The ladder is only re-armed by [`TrackingSession::set_target`] and [`TrackingSession::clear_target`].
/// Stopping and restarting tracking for the same target keeps the fired thresholds, so an alert the
/// user already saw does not repeat.
#[derive(Debug)]
pub struct TrackingSession {
    state: SessionState,
    target: Option<Target>,
    ladder: ThresholdLadder,
    last_distance_m: Option<f64>,
    last_eta: Option<Duration>,
    last_bearing: Option<f64>,
    last_fix_at: Option<DateTime<Utc>>,
    error: Option<PositionError>,
    reject_stale_fixes: bool,
}

impl TrackingSession {
    pub fn new(ladder: ThresholdLadder, reject_stale_fixes: bool) -> Self {
        TrackingSession {
            state: SessionState::Idle,
            target: None,
            ladder,
            last_distance_m: None,
            last_eta: None,
            last_bearing: None,
            last_fix_at: None,
            error: None,
            reject_stale_fixes,
        }
    }

    #[instrument(skip_all, fields(destination = target.id()))]
    pub fn set_target(&mut self, target: Target) {
        if self.state == SessionState::Tracking {
            info!("🛑 Tracking cancelled, the target changed");
        }

        info!("📍 Target set to '{}'", target.display_name());
        self.target = Some(target);
        self.state = SessionState::Armed;
        self.rearm();
    }

    pub fn clear_target(&mut self) {
        if let Some(target) = self.target.take() {
            info!(destination = target.id(), "📍 Target '{}' cleared", target.display_name());
        }

        self.state = SessionState::Idle;
        self.rearm();
    }

    pub fn start_tracking(&mut self) -> Result<(), SessionError> {
        let Some(target) = &self.target else {
            return Err(SessionError::NoTarget);
        };

        if let Some(error) = &self.error {
            return Err(SessionError::PositionUnavailable(error.clone()));
        }

        if self.state != SessionState::Tracking {
            info!(destination = target.id(), "▶️ Tracking '{}'", target.display_name());
            self.state = SessionState::Tracking;
        }

        Ok(())
    }

    /// Stops consuming fixes. The fired thresholds are kept.
    pub fn stop_tracking(&mut self) {
        if self.state != SessionState::Tracking {
            return;
        }

        info!("⏹️ Tracking stopped");
        self.state = SessionState::Armed;
        self.clear_measurements();
    }

    /// Updates distance and ETA, returning an event if the fix crossed a threshold. Fixes are ignored
    /// unless the session is tracking.
    pub fn on_position_fix(&mut self, fix: &PositionFix) -> Option<AlertEvent> {
        if self.state != SessionState::Tracking {
            return None;
        }
        let target = self.target.as_ref()?;

        if self.reject_stale_fixes && self.last_fix_at.is_some_and(|last| fix.timestamp < last) {
            debug!(timestamp = %fix.timestamp, "🛰️ Ignoring a fix older than the last one");
            return None;
        }

        if self.error.take().is_some() {
            info!("🛰️ Position available again");
        }

        let distance_m = geo::distance(fix.coordinate, target.coordinate());
        self.last_distance_m = Some(distance_m);
        self.last_eta = geo::eta(distance_m, fix.speed);
        self.last_bearing = Some(geo::bearing(fix.coordinate, target.coordinate()));
        self.last_fix_at = Some(fix.timestamp);
        debug!(distance_m, speed = ?fix.speed, "🛰️ {} to '{}'", geo::format_distance(distance_m), target.display_name());

        let threshold = self.ladder.evaluate(distance_m)?;
        Some(AlertEvent {
            threshold,
            target: target.clone(),
            distance_m,
        })
    }

    pub fn on_position_error(&mut self, error: PositionError) {
        warn!("⚠️ {}", error);
        self.error = Some(error);
    }

    pub fn clear_position_error(&mut self) {
        self.error = None;
    }

    /// Replaces the alert distances of the current session.
    pub fn set_thresholds(&mut self, distances: &[f64]) -> Result<(), SessionError> {
        self.ladder.replace(distances)?;
        info!("🎯 Alert distances set to {:?}", distances);
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn ladder(&self) -> &ThresholdLadder {
        &self.ladder
    }

    pub fn last_distance_m(&self) -> Option<f64> {
        self.last_distance_m
    }

    pub fn last_eta(&self) -> Option<Duration> {
        self.last_eta
    }

    pub fn error(&self) -> Option<&PositionError> {
        self.error.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            target: self.target.as_ref().map(Target::display_name),
            distance_m: self.last_distance_m,
            eta: self.last_eta,
            bearing: self.last_bearing,
            error: self.error.as_ref().map(ToString::to_string),
        }
    }

    fn rearm(&mut self) {
        self.ladder.reset();
        self.clear_measurements();
        self.last_fix_at = None;
    }

    fn clear_measurements(&mut self) {
        self.last_distance_m = None;
        self.last_eta = None;
        self.last_bearing = None;
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum SessionError {
    #[error("no target set")]
    NoTarget,
    #[error("cannot track, {0}")]
    PositionUnavailable(PositionError),
    #[error(transparent)]
    InvalidThresholds(#[from] LadderError),
}

/// A snapshot of the session for display.
#[derive(Clone, PartialEq, Debug)]
pub struct SessionStatus {
    pub state: SessionState,
    pub target: Option<String>,
    pub distance_m: Option<f64>,
    pub eta: Option<Duration>,
    pub bearing: Option<f64>,
    pub error: Option<String>,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // A position error replaces the measurements
        if let Some(error) = &self.error {
            return write!(f, "{}", error);
        }

        let Some(target) = &self.target else {
            return write!(f, "no destination set");
        };

        match (self.state, self.distance_m) {
            (SessionState::Tracking, Some(distance_m)) => {
                write!(f, "{} to {}", geo::format_distance(distance_m), target)?;
                if let Some(bearing) = self.bearing {
                    write!(f, " ({})", geo::compass_point(bearing))?;
                }
                match self.eta {
                    Some(eta) => write!(f, ", ETA {} ({})", geo::format_eta(eta), geo::arrival_time(Local::now(), eta)),
                    None => write!(f, ", ETA unknown"),
                }
            }
            (SessionState::Tracking, None) => write!(f, "tracking {}, waiting for a position", target),
            _ => write!(f, "{} set, not tracking", target),
        }
    }
}
