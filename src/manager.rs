//! PWM Channel Manager
//!
//! Ties the name resolver, the state table and a [`PwmDriver`] together.
//! Each operation locks the channel's slot for its whole duration, so the
//! driver writes for one channel are never interleaved with another
//! operation on the same channel.
//!
//! # Write ordering
//!
//! The kernel rejects any write that would leave `duty_cycle > period`.
//! When both change, the write that keeps the pair valid goes first:
//!
//! | current duty fits new period | order                 |
//! |------------------------------|-----------------------|
//! | yes                          | period, then duty     |
//! | no                           | duty, then period     |
//!
//! One of the two orders is always valid, because the old pair and the new
//! pair each satisfy `duty <= period`.

use bbpwm_board::{resolve, HardwareKey};
use bbpwm_driver::{ConfigError, DriverError, Polarity, PwmDriver, SysfsConfig, SysfsDriver};
use log::{debug, info, warn};

use crate::state::{ChannelGuard, ChannelState, ChannelStateTable, Settings};
use crate::timing::{check_duty_cycle, duty_cycle_ns, period_ns};
use crate::{PwmError, Result};

/// Start, stop and reconfigure PWM outputs by name.
///
/// Shared freely between threads when `D` is `Sync`.
#[derive(Debug)]
pub struct ChannelManager<D> {
    driver: D,
    table: ChannelStateTable,
}

impl ChannelManager<SysfsDriver> {
    /// Manager for the real hardware, driven through sysfs.
    ///
    /// # Errors
    /// Returns an error if `config` names an unknown controller.
    pub fn sysfs(config: SysfsConfig) -> core::result::Result<Self, ConfigError> {
        Ok(Self::new(SysfsDriver::new(config)?))
    }
}

impl<D> ChannelManager<D>
where
    D: PwmDriver,
{
    /// A manager with every channel stopped.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            table: ChannelStateTable::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Read access to the recorded state of every channel.
    pub fn table(&self) -> &ChannelStateTable {
        &self.table
    }

    /// Recorded state of the channel called `name`.
    ///
    /// # Errors
    /// [`PwmError::UnknownChannel`] if `name` does not resolve.
    pub fn state(&self, name: &str) -> Result<ChannelState> {
        Ok(self.table.get(resolve(name)?))
    }

    /// Channels currently running.
    pub fn running(&self) -> Vec<HardwareKey> {
        self.table.exported()
    }

    /// Start `name` with normal polarity.
    ///
    /// `duty_cycle` is a percentage, `frequency` is in hertz. Starting a
    /// channel that is already running reconfigures it.
    ///
    /// # Errors
    /// [`PwmError::InvalidArgument`] for an out of range duty cycle or
    /// frequency, [`PwmError::UnknownChannel`] for an unknown name,
    /// [`PwmError::Hardware`] if a driver write fails.
    pub fn start(&self, name: &str, duty_cycle: f64, frequency: f64) -> Result<()> {
        self.start_with_polarity(name, duty_cycle, frequency, Polarity::Normal)
    }

    /// Like [`ChannelManager::start`], with an explicit polarity.
    ///
    /// # Errors
    /// See [`ChannelManager::start`].
    pub fn start_with_polarity(
        &self,
        name: &str,
        duty_cycle: f64,
        frequency: f64,
        polarity: Polarity,
    ) -> Result<()> {
        let duty_percent = check_duty_cycle(duty_cycle)?;
        let period_ns = period_ns(frequency)?;
        let key = resolve(name)?;

        let settings = Settings {
            period_ns,
            duty_cycle_ns: duty_cycle_ns(period_ns, duty_percent),
            duty_percent,
            polarity,
        };

        let mut slot = self.table.lock(key);
        match slot.get().settings() {
            None => self.bring_up(key, &settings)?,
            Some(current) => self.reconfigure(key, current, &settings)?,
        }
        slot.set_exported(settings)?;

        info!(
            "{key}: running at {frequency} Hz, {duty_percent}% ({} ns / {} ns, {polarity})",
            settings.duty_cycle_ns, settings.period_ns
        );
        Ok(())
    }

    /// Disable and release `name`.
    ///
    /// The driver is always asked to disable and unexport, even if the
    /// channel was never started.
    ///
    /// # Errors
    /// [`PwmError::UnknownChannel`] for an unknown name, [`PwmError::Hardware`]
    /// if the driver rejects either step. The recorded state is only
    /// cleared once both succeed.
    pub fn stop(&self, name: &str) -> Result<()> {
        let key = resolve(name)?;
        let mut slot = self.table.lock(key);
        let was_running = slot.get().is_exported();

        self.release(key)?;
        slot.clear_exported();

        if was_running {
            info!("{key}: stopped");
        } else {
            debug!("{key}: stop on a channel that was not running");
        }
        Ok(())
    }

    /// Change the duty cycle of a running channel, keeping its frequency.
    ///
    /// # Errors
    /// [`PwmError::InvalidArgument`] for an out of range duty cycle,
    /// [`PwmError::UnknownChannel`] for an unknown name,
    /// [`PwmError::NotStarted`] if the channel is not running,
    /// [`PwmError::Hardware`] if the write fails.
    pub fn set_duty_cycle(&self, name: &str, duty_cycle: f64) -> Result<()> {
        let duty_percent = check_duty_cycle(duty_cycle)?;
        let key = resolve(name)?;

        let mut slot = self.table.lock(key);
        let current = slot.running()?;
        let duty_ns = duty_cycle_ns(current.period_ns, duty_percent);

        self.driver
            .write_duty_cycle(key, duty_ns)
            .map_err(hardware(key))?;
        slot.set_duty(duty_ns, duty_percent)?;

        debug!("{key}: duty cycle {duty_percent}% ({duty_ns} ns)");
        Ok(())
    }

    /// Change the frequency of a running channel, keeping its duty
    /// percentage.
    ///
    /// # Errors
    /// [`PwmError::InvalidArgument`] for a frequency that is not positive,
    /// [`PwmError::UnknownChannel`] for an unknown name,
    /// [`PwmError::NotStarted`] if the channel is not running,
    /// [`PwmError::Hardware`] if a write fails.
    pub fn set_frequency(&self, name: &str, frequency: f64) -> Result<()> {
        let period_ns = period_ns(frequency)?;
        let key = resolve(name)?;

        let mut slot = self.table.lock(key);
        let current = slot.running()?;
        let duty_ns = duty_cycle_ns(period_ns, current.duty_percent);

        self.write_timing(key, &current, period_ns, duty_ns)?;
        slot.set_period(period_ns, duty_ns)?;

        debug!("{key}: frequency {frequency} Hz ({duty_ns} ns / {period_ns} ns)");
        Ok(())
    }

    /// Disable and release every running channel.
    ///
    /// Driver failures are logged and skipped; every running channel is
    /// attempted and every one ends up recorded as stopped.
    pub fn cleanup_all(&self) {
        let mut released = 0;
        for key in HardwareKey::all() {
            let mut slot = self.table.lock(key);
            if !slot.get().is_exported() {
                continue;
            }
            self.release_best_effort(&slot);
            slot.clear_exported();
            released += 1;
        }
        info!("cleanup: released {released} channel(s)");
    }

    /// export → period → duty cycle → polarity → enable, for a stopped
    /// channel. On failure anything already claimed is released again.
    ///
    /// The channel may still be exported by an earlier process. Export then
    /// leaves it disabled at zero duty, so the first period write fits.
    fn bring_up(&self, key: HardwareKey, settings: &Settings) -> Result<()> {
        self.driver.export_channel(key).map_err(hardware(key))?;

        let configured = self
            .driver
            .write_period(key, settings.period_ns)
            .and_then(|()| self.driver.write_duty_cycle(key, settings.duty_cycle_ns))
            .and_then(|()| self.driver.set_polarity(key, settings.polarity))
            .and_then(|()| self.driver.set_enabled(key, true));

        if let Err(e) = configured {
            if let Err(rollback) = self.release(key) {
                warn!("{key}: could not release after failed start: {rollback}");
            }
            return Err(hardware(key)(e));
        }
        Ok(())
    }

    /// Apply new settings to a running channel without re-exporting it.
    ///
    /// A polarity change needs the output disabled. If a write fails after
    /// that, the output is switched back on so it keeps matching the
    /// recorded state.
    fn reconfigure(&self, key: HardwareKey, current: &Settings, new: &Settings) -> Result<()> {
        if current.polarity == new.polarity {
            self.write_timing(key, current, new.period_ns, new.duty_cycle_ns)?;
            return self.driver.set_enabled(key, true).map_err(hardware(key));
        }

        self.driver.set_enabled(key, false).map_err(hardware(key))?;
        let applied = self
            .write_timing(key, current, new.period_ns, new.duty_cycle_ns)
            .and_then(|()| {
                self.driver
                    .set_polarity(key, new.polarity)
                    .map_err(hardware(key))
            });

        if let Err(e) = applied {
            match self.driver.set_enabled(key, true) {
                Ok(()) => debug!("{key}: re-enabled after failed reconfigure"),
                Err(restore) => {
                    warn!("{key}: could not re-enable after failed reconfigure: {restore}")
                }
            }
            return Err(e);
        }
        self.driver.set_enabled(key, true).map_err(hardware(key))
    }

    /// Write a new period and duty cycle so that no intermediate state has
    /// the duty cycle longer than the period.
    fn write_timing(
        &self,
        key: HardwareKey,
        current: &Settings,
        period_ns: u64,
        duty_ns: u64,
    ) -> Result<()> {
        if current.duty_cycle_ns <= period_ns {
            debug!("{key}: period {period_ns} ns before duty cycle {duty_ns} ns");
            self.driver.write_period(key, period_ns).map_err(hardware(key))?;
            self.driver.write_duty_cycle(key, duty_ns).map_err(hardware(key))
        } else {
            debug!("{key}: duty cycle {duty_ns} ns before period {period_ns} ns");
            self.driver.write_duty_cycle(key, duty_ns).map_err(hardware(key))?;
            self.driver.write_period(key, period_ns).map_err(hardware(key))
        }
    }

    fn release(&self, key: HardwareKey) -> Result<()> {
        self.driver.set_enabled(key, false).map_err(hardware(key))?;
        self.driver.unexport_channel(key).map_err(hardware(key))
    }

    fn release_best_effort(&self, slot: &ChannelGuard<'_>) {
        let key = slot.key();
        if let Err(e) = self.driver.set_enabled(key, false) {
            warn!("{key}: disable failed during cleanup: {e}");
        }
        if let Err(e) = self.driver.unexport_channel(key) {
            warn!("{key}: unexport failed during cleanup: {e}");
        }
    }
}

fn hardware(key: HardwareKey) -> impl FnOnce(DriverError) -> PwmError {
    move |source| PwmError::Hardware { key, source }
}
