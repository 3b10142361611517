mod replay;

pub use replay::{ReplaySource, Subscription, subscribe};
