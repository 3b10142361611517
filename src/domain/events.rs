use crate::alerting::DeliveryReport;
use crate::domain::commands::Command;
use crate::domain::{PositionError, PositionFix};

#[derive(Debug)]
pub enum Event {
    PositionFix(PositionFix),
    PositionError(PositionError),
    Command(Command),
    /// A background notification finished
    Delivered(DeliveryReport),
}
