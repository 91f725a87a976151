//! Linux PWM class driver.
//!
//! Layout handled here:
//!
//! ```text
//! <sysfs_root>/pwmchip<N>/export        write <C> to claim channel C
//! <sysfs_root>/pwmchip<N>/unexport      write <C> to release it
//! <sysfs_root>/pwmchip<N>/pwm<C>/period      ns
//! <sysfs_root>/pwmchip<N>/pwm<C>/duty_cycle  ns, never above period
//! <sysfs_root>/pwmchip<N>/pwm<C>/polarity    "normal" | "inversed"
//! <sysfs_root>/pwmchip<N>/pwm<C>/enable      "1" | "0"
//! ```

mod config;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use bbpwm_board::{HardwareKey, Peripheral};
use log::{debug, trace};

pub use self::config::SysfsConfig;
use crate::{ConfigError, DriverError, Polarity, PwmDriver};

const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// [`PwmDriver`] backed by `/sys/class/pwm`.
#[derive(Debug, Clone)]
pub struct SysfsDriver {
    root: PathBuf,
    chips: BTreeMap<Peripheral, u32>,
    export_timeout: Duration,
}

impl SysfsDriver {
    /// # Errors
    /// Returns [`ConfigError::UnknownPeripheral`] if the chip table names a
    /// controller this board does not have.
    pub fn new(config: SysfsConfig) -> Result<Self, ConfigError> {
        let chips = config.chip_map()?;
        Ok(Self {
            export_timeout: config.export_timeout(),
            root: config.sysfs_root,
            chips,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `pwmchip<N>` directory of the controller that owns `key`.
    pub fn chip_dir(&self, key: HardwareKey) -> Result<PathBuf, DriverError> {
        let chip = self
            .chips
            .get(&key.peripheral())
            .ok_or(DriverError::Unmapped(key))?;
        Ok(self.root.join(format!("pwmchip{chip}")))
    }

    /// `pwm<C>` directory of `key`. Only present while exported.
    pub fn channel_dir(&self, key: HardwareKey) -> Result<PathBuf, DriverError> {
        Ok(self.chip_dir(key)?.join(format!("pwm{}", key.channel())))
    }

    fn write_channel_attr(
        &self,
        key: HardwareKey,
        attr: &str,
        value: impl Display,
    ) -> Result<(), DriverError> {
        write_attr(&self.channel_dir(key)?.join(attr), value)
    }

    fn wait_for_export(&self, channel_dir: &Path) -> Result<(), DriverError> {
        let deadline = Instant::now() + self.export_timeout;
        while !channel_dir.is_dir() {
            if Instant::now() >= deadline {
                return Err(DriverError::ExportTimeout {
                    path: channel_dir.to_path_buf(),
                    timeout: self.export_timeout,
                });
            }
            thread::sleep(EXPORT_POLL_INTERVAL);
        }
        Ok(())
    }
}

impl PwmDriver for SysfsDriver {
    fn export_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        let chip_dir = self.chip_dir(key)?;
        let channel_dir = chip_dir.join(format!("pwm{}", key.channel()));
        if channel_dir.is_dir() {
            debug!("{key}: {} already exported", channel_dir.display());
        } else {
            debug!("{key}: exporting via {}", chip_dir.display());
            write_attr(&chip_dir.join("export"), key.channel())?;
            self.wait_for_export(&channel_dir)?;
        }

        // A previous user may have left the output enabled or with a duty
        // cycle longer than the period we are about to write.
        if let Err(e) = write_attr(&channel_dir.join("enable"), 0) {
            debug!("{key}: could not reset enable after export: {e}");
        }
        if let Err(e) = write_attr(&channel_dir.join("duty_cycle"), 0) {
            debug!("{key}: could not reset duty_cycle after export: {e}");
        }
        Ok(())
    }

    fn unexport_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        let chip_dir = self.chip_dir(key)?;
        if !chip_dir.join(format!("pwm{}", key.channel())).is_dir() {
            debug!("{key}: not exported, nothing to release");
            return Ok(());
        }

        debug!("{key}: unexporting via {}", chip_dir.display());
        write_attr(&chip_dir.join("unexport"), key.channel())
    }

    fn write_period(&self, key: HardwareKey, period_ns: u64) -> Result<(), DriverError> {
        self.write_channel_attr(key, "period", period_ns)
    }

    fn write_duty_cycle(&self, key: HardwareKey, duty_cycle_ns: u64) -> Result<(), DriverError> {
        self.write_channel_attr(key, "duty_cycle", duty_cycle_ns)
    }

    fn set_polarity(&self, key: HardwareKey, polarity: Polarity) -> Result<(), DriverError> {
        self.write_channel_attr(key, "polarity", polarity)
    }

    fn set_enabled(&self, key: HardwareKey, enabled: bool) -> Result<(), DriverError> {
        let channel_dir = self.channel_dir(key)?;
        if !enabled && !channel_dir.is_dir() {
            return Ok(());
        }
        write_attr(&channel_dir.join("enable"), u8::from(enabled))
    }
}

/// Write one attribute value. sysfs attributes already exist, so the file
/// is never created.
fn write_attr(path: &Path, value: impl Display) -> Result<(), DriverError> {
    trace!("{} <- {value}", path.display());
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| DriverError::io(path, e))?;
    file.write_all(value.to_string().as_bytes())
        .map_err(|e| DriverError::io(path, e))
}
