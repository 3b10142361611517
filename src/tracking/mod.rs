mod ladder;
mod session;

pub use ladder::{AlertThreshold, LadderError, ThresholdLadder};
pub use session::{AlertEvent, SessionError, SessionState, SessionStatus, TrackingSession};
