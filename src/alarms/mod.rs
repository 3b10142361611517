mod checker;

pub use checker::AlarmChecker;
