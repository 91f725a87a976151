use bbpwm_board::{HardwareKey, ResolveError};
use bbpwm_driver::DriverError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, PwmError>;

/// Errors returned by channel operations.
///
/// A failed operation leaves the channel's recorded state as it was.
#[derive(Debug, Error)]
pub enum PwmError {
    #[error("unknown PWM channel {0:?}")]
    UnknownChannel(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("PWM channel {0} has not been started")]
    NotStarted(HardwareKey),
    #[error("PWM hardware error on {key}")]
    Hardware {
        key: HardwareKey,
        #[source]
        source: DriverError,
    },
}

impl From<ResolveError> for PwmError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnknownChannel(name) => PwmError::UnknownChannel(name),
        }
    }
}
