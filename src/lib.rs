//! BeagleBone PWM Channel Management
//!
//! Start, stop and retune the PWM outputs of a BeagleBone-class board by
//! name. The kernel's PWM driver generates the waveform; this crate decides
//! what to write to it and in which order, and remembers what every output
//! was set to.
//!
//! # Components
//!
//! - [`bbpwm_board`] - the name table (`"P9_22"`, `"EHRPWM0A"`, ...) and [`HardwareKey`]
//! - [`state`] - the per-channel state table
//! - [`bbpwm_driver`] - the [`PwmDriver`] trait and its sysfs implementation
//! - [`ChannelManager`] - the operations callers use
//!
//! # Quick Start
//!
//! ```ignore
//! use bbpwm::{ChannelManager, SysfsConfig};
//!
//! let pwm = ChannelManager::sysfs(SysfsConfig::default())?;
//!
//! pwm.start("P9_22", 25.0, 1000.0)?;
//! pwm.set_duty_cycle("P9_22", 75.0)?;
//! pwm.set_frequency("P9_22", 500.0)?; // still 75%
//! pwm.stop("P9_22")?;
//!
//! // On the way out, release anything still running.
//! pwm.cleanup_all();
//! ```
//!
//! Nothing is released automatically. Programs that may exit with outputs
//! running should call [`ChannelManager::cleanup_all`] from their shutdown
//! path.

mod error;
mod manager;
pub mod state;
pub mod timing;

pub use bbpwm_board::{resolve, HardwareKey, Peripheral};
pub use bbpwm_driver::{ConfigError, DriverError, Polarity, PwmDriver, SysfsConfig, SysfsDriver};
pub use error::{PwmError, Result};
pub use manager::ChannelManager;
pub use state::{ChannelState, ChannelStateTable};
pub use timing::{DEFAULT_DUTY_CYCLE, DEFAULT_FREQUENCY_HZ};
