use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, PartialEq, Debug)]
pub struct AlertThreshold {
    id: String,
    distance_m: f64,
    fired: bool,
}

impl AlertThreshold {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn fired(&self) -> bool {
        self.fired
    }
}

/// The alert distances of the current target, ordered outermost first, together with the thresholds
/// that already fired this session.
///
/// A threshold fires at most once until [`ThresholdLadder::reset`] re-arms it.
#[derive(Clone, Default, Debug)]
pub struct ThresholdLadder {
    thresholds: Vec<AlertThreshold>,
}

impl ThresholdLadder {
    pub fn new(distances: &[f64]) -> Result<Self, LadderError> {
        let mut ladder = ThresholdLadder::default();
        ladder.replace(distances)?;
        Ok(ladder)
    }

    /// Replaces the configured distances. A distance that already fired this session stays fired,
    /// new distances are armed.
    pub fn replace(&mut self, distances: &[f64]) -> Result<(), LadderError> {
        if let Some(invalid) = distances.iter().find(|distance| !distance.is_finite() || **distance <= 0.0) {
            return Err(LadderError::InvalidDistance(*invalid));
        }

        let mut thresholds = distances
            .iter()
            .enumerate()
            .map(|(index, distance)| AlertThreshold {
                id: format!("threshold-{}", index),
                distance_m: *distance,
                fired: self.thresholds.iter().any(|t| t.fired && t.distance_m == *distance),
            })
            .collect::<Vec<_>>();

        // Stable, so equal distances keep their configured order
        thresholds.sort_by_key(|threshold| Reverse(OrderedFloat(threshold.distance_m)));
        self.thresholds = thresholds;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.thresholds.iter_mut().for_each(|threshold| threshold.fired = false);
    }

    /// Fires the outermost unfired threshold that encloses `current_distance_m`. At most one
    /// threshold fires per call; inner thresholds crossed by the same fix stay pending.
    pub fn evaluate(&mut self, current_distance_m: f64) -> Option<AlertThreshold> {
        let threshold = self
            .thresholds
            .iter_mut()
            .find(|threshold| !threshold.fired && threshold.distance_m >= current_distance_m)?;

        threshold.fired = true;
        debug!(threshold = threshold.id, "🎯 Crossed the {} m threshold at {:.0} m", threshold.distance_m, current_distance_m);
        Some(threshold.clone())
    }

    pub fn thresholds(&self) -> &[AlertThreshold] {
        &self.thresholds
    }

    pub fn pending(&self) -> impl Iterator<Item = &AlertThreshold> {
        self.thresholds.iter().filter(|threshold| !threshold.fired)
    }
}

#[derive(Error, PartialEq, Debug)]
pub enum LadderError {
    #[error("invalid alert distance {0}, must be a positive number of meters")]
    InvalidDistance(f64),
}
