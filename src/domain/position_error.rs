use thiserror::Error;

#[derive(Error, Clone, PartialEq, Debug)]
pub enum PositionError {
    #[error("location access denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out")]
    Timeout,
}
