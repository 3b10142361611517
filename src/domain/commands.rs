use crate::domain::{AlertOptions, Coordinate};

#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    SetTarget(TargetRef),
    ClearTarget,
    StartTracking,
    StopTracking,
    Acknowledge,
    Visibility(bool),
    Status,
    SetThresholds(Vec<f64>),
    SetOptions(AlertOptions),
    ClearPositionError,
    ReenableAlarm(String),
    Quit,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TargetRef {
    Place(String),
    Coordinate { coordinate: Coordinate, name: Option<String> },
}
