//! PWM Output Driver
//!
//! The low-level side of PWM control: claiming an output from the kernel,
//! writing its period and duty cycle, and switching it on and off. Nothing
//! in here remembers what was configured; callers keep that state and drive
//! the writes in a safe order.
//!
//! # Implementations
//!
//! - [`SysfsDriver`] talks to the Linux PWM class under `/sys/class/pwm`.
//! - [`mock::MockDriver`] (feature `mock`) records every call and can be told
//!   to fail specific operations.

mod error;
pub mod sysfs;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use core::fmt;

pub use bbpwm_board::HardwareKey;
pub use error::{ConfigError, DriverError};
pub use sysfs::{SysfsConfig, SysfsDriver};

/// Output polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Output is high for the duty cycle part of the period
    #[default]
    Normal,
    /// Output is low for the duty cycle part of the period
    Inversed,
}

impl Polarity {
    /// Value understood by the kernel's `polarity` attribute.
    pub const fn as_sysfs(self) -> &'static str {
        match self {
            Polarity::Normal => "normal",
            Polarity::Inversed => "inversed",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sysfs())
    }
}

/// Operations a PWM backend provides for one output.
///
/// Every call is a single, immediate hardware write. Implementations must
/// not retry on failure and must not reorder writes; callers rely on the
/// kernel seeing them in call order.
pub trait PwmDriver {
    /// Claim `key` for user-space control.
    ///
    /// Exporting an output that is already exported succeeds. Either way
    /// the output is left disabled with a zero duty cycle, so a leftover
    /// duty cycle cannot collide with the next period written.
    fn export_channel(&self, key: HardwareKey) -> Result<(), DriverError>;

    /// Release `key` back to the kernel.
    ///
    /// Unexporting an output that is not exported succeeds.
    fn unexport_channel(&self, key: HardwareKey) -> Result<(), DriverError>;

    /// Set the period, in nanoseconds.
    fn write_period(&self, key: HardwareKey, period_ns: u64) -> Result<(), DriverError>;

    /// Set the active time per period, in nanoseconds.
    fn write_duty_cycle(&self, key: HardwareKey, duty_cycle_ns: u64) -> Result<(), DriverError>;

    /// Set the output polarity. Most controllers only accept this while disabled.
    fn set_polarity(&self, key: HardwareKey, polarity: Polarity) -> Result<(), DriverError>;

    /// Switch the output on or off.
    fn set_enabled(&self, key: HardwareKey, enabled: bool) -> Result<(), DriverError>;
}

impl<D> PwmDriver for &D
where
    D: PwmDriver + ?Sized,
{
    fn export_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        (**self).export_channel(key)
    }

    fn unexport_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        (**self).unexport_channel(key)
    }

    fn write_period(&self, key: HardwareKey, period_ns: u64) -> Result<(), DriverError> {
        (**self).write_period(key, period_ns)
    }

    fn write_duty_cycle(&self, key: HardwareKey, duty_cycle_ns: u64) -> Result<(), DriverError> {
        (**self).write_duty_cycle(key, duty_cycle_ns)
    }

    fn set_polarity(&self, key: HardwareKey, polarity: Polarity) -> Result<(), DriverError> {
        (**self).set_polarity(key, polarity)
    }

    fn set_enabled(&self, key: HardwareKey, enabled: bool) -> Result<(), DriverError> {
        (**self).set_enabled(key, enabled)
    }
}
