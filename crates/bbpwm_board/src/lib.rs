//! BeagleBone Black PWM Board Description
//!
//! Static knowledge about which PWM outputs exist on the board and what
//! they are called. Callers name an output either by its header pin
//! (`"P9_22"`) or by its peripheral output (`"EHRPWM0A"`); both resolve to
//! the same [`HardwareKey`].
//!
//! ```
//! use bbpwm_board::{resolve, Peripheral};
//!
//! let key = resolve("P9_22").unwrap();
//! assert_eq!(key, resolve("EHRPWM0A").unwrap());
//! assert_eq!(key.peripheral(), Peripheral::Ehrpwm0);
//! assert_eq!(key.channel(), 0);
//! ```
//!
//! Nothing here touches hardware and nothing needs initialisation: the name
//! table is a sorted static slice.

mod key;
mod names;

pub use key::{HardwareKey, Peripheral, UnknownPeripheral};
pub use names::{aliases, names, resolve, ResolveError};
