//! Sysfs driver configuration.
//!
//! The kernel numbers `pwmchip` directories in probe order, which depends on
//! the kernel version and the loaded device-tree overlays, so the mapping
//! from controller to chip number is configurable.
//!
//! ```toml
//! sysfs_root = "/sys/class/pwm"
//! export_timeout_ms = 500
//!
//! [chips]
//! ehrpwm0 = 1
//! ehrpwm1 = 3
//! timer6 = 7
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bbpwm_board::Peripheral;
use serde::Deserialize;

use crate::ConfigError;

const DEFAULT_SYSFS_ROOT: &str = "/sys/class/pwm";
const DEFAULT_EXPORT_TIMEOUT_MS: u64 = 500;

/// Chip numbers on a stock BeagleBone Black image. The DMTimer outputs need
/// an overlay and are left unmapped.
const DEFAULT_CHIPS: [(Peripheral, u32); 5] = [
    (Peripheral::Ecap0, 0),
    (Peripheral::Ehrpwm0, 1),
    (Peripheral::Ehrpwm1, 3),
    (Peripheral::Ecap2, 4),
    (Peripheral::Ehrpwm2, 5),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SysfsConfig {
    /// Directory containing the `pwmchip<N>` entries.
    pub sysfs_root: PathBuf,
    /// How long to wait for `pwm<C>` to appear after writing `export`.
    /// The caller's channel lock is held for the whole wait.
    pub export_timeout_ms: u64,
    /// Controller name to `pwmchip` number.
    pub chips: BTreeMap<String, u32>,
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            export_timeout_ms: DEFAULT_EXPORT_TIMEOUT_MS,
            chips: DEFAULT_CHIPS
                .into_iter()
                .map(|(p, chip)| (p.name().to_owned(), chip))
                .collect(),
        }
    }
}

impl SysfsConfig {
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this structure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    /// Returns an error if `text` is not valid TOML for this structure.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_ms)
    }

    /// The `[chips]` table with controller names checked.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownPeripheral`] for the first name that is
    /// not a controller of this board.
    pub fn chip_map(&self) -> Result<BTreeMap<Peripheral, u32>, ConfigError> {
        self.chips
            .iter()
            .map(|(name, chip)| {
                name.parse::<Peripheral>()
                    .map(|p| (p, *chip))
                    .map_err(|_| ConfigError::UnknownPeripheral(name.clone()))
            })
            .collect()
    }
}
