//! Channel State Table
//!
//! One slot per [`HardwareKey`], each behind its own lock. A slot is either
//! stopped (nothing recorded) or running with the settings last applied to
//! the hardware. The stopped state carries no period or duty cycle at all,
//! so "not exported but configured" cannot be represented.
//!
//! Holding a `ChannelGuard` serialises every operation on that key while
//! leaving the other keys free. Only the manager takes guards or changes
//! a slot, so a slot is marked running only after a successful start.
//! Callers outside the crate get read access.

use bbpwm_board::HardwareKey;
use bbpwm_driver::Polarity;
use spin::{Mutex, MutexGuard};

use crate::{PwmError, Result};

/// What a running channel was last configured to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub period_ns: u64,
    pub duty_cycle_ns: u64,
    /// The percentage `duty_cycle_ns` was derived from. Kept so a frequency
    /// change can preserve it exactly instead of from rounded nanoseconds.
    pub duty_percent: f64,
    pub polarity: Polarity,
}

/// Recorded state of one output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    settings: Option<Settings>,
}

impl ChannelState {
    pub fn is_exported(&self) -> bool {
        self.settings.is_some()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn period_ns(&self) -> Option<u64> {
        self.settings.map(|s| s.period_ns)
    }

    pub fn duty_cycle_ns(&self) -> Option<u64> {
        self.settings.map(|s| s.duty_cycle_ns)
    }

    pub fn duty_percent(&self) -> Option<f64> {
        self.settings.map(|s| s.duty_percent)
    }

    pub fn polarity(&self) -> Option<Polarity> {
        self.settings.map(|s| s.polarity)
    }
}

/// Exclusive access to one slot of the table.
pub(crate) struct ChannelGuard<'a> {
    key: HardwareKey,
    state: MutexGuard<'a, ChannelState>,
}

impl ChannelGuard<'_> {
    pub fn key(&self) -> HardwareKey {
        self.key
    }

    pub fn get(&self) -> ChannelState {
        *self.state
    }

    /// Settings of a running channel.
    ///
    /// # Errors
    /// [`PwmError::NotStarted`] if the channel is stopped.
    pub fn running(&self) -> Result<Settings> {
        self.state.settings.ok_or(PwmError::NotStarted(self.key))
    }

    /// Record the channel as exported and running with `settings`.
    ///
    /// # Errors
    /// [`PwmError::InvalidArgument`] if the duty cycle exceeds the period.
    pub fn set_exported(&mut self, settings: Settings) -> Result<()> {
        check_fits(settings.period_ns, settings.duty_cycle_ns)?;
        self.state.settings = Some(settings);
        Ok(())
    }

    /// # Errors
    /// [`PwmError::NotStarted`] if the channel is stopped,
    /// [`PwmError::InvalidArgument`] if the duty cycle exceeds the period.
    pub fn set_duty(&mut self, duty_cycle_ns: u64, duty_percent: f64) -> Result<()> {
        let mut settings = self.running()?;
        check_fits(settings.period_ns, duty_cycle_ns)?;
        settings.duty_cycle_ns = duty_cycle_ns;
        settings.duty_percent = duty_percent;
        self.state.settings = Some(settings);
        Ok(())
    }

    /// Change the period together with the duty cycle rescaled to it. The
    /// duty percentage is kept.
    ///
    /// # Errors
    /// [`PwmError::NotStarted`] if the channel is stopped,
    /// [`PwmError::InvalidArgument`] if the duty cycle exceeds the period.
    pub fn set_period(&mut self, period_ns: u64, duty_cycle_ns: u64) -> Result<()> {
        let mut settings = self.running()?;
        check_fits(period_ns, duty_cycle_ns)?;
        settings.period_ns = period_ns;
        settings.duty_cycle_ns = duty_cycle_ns;
        self.state.settings = Some(settings);
        Ok(())
    }

    pub fn clear_exported(&mut self) {
        self.state.settings = None;
    }
}

fn check_fits(period_ns: u64, duty_cycle_ns: u64) -> Result<()> {
    if duty_cycle_ns > period_ns {
        return Err(PwmError::InvalidArgument(format!(
            "duty cycle {duty_cycle_ns} ns exceeds period {period_ns} ns"
        )));
    }
    Ok(())
}

/// Fixed-size registry of every output's state.
///
/// The slot locks are spin locks and stay held for a whole driver write
/// sequence. That includes the sysfs export wait, which polls for up to
/// the configured export timeout, so another caller on the same key busy
/// waits for that long. Keep `export_timeout_ms` short on single-core
/// boards.
///
/// Slots cannot be locked or changed from outside the crate:
///
/// ```compile_fail
/// let table = bbpwm::ChannelStateTable::new();
/// let key = bbpwm::resolve("P9_22").unwrap();
/// let _slot = table.lock(key);
/// ```
#[derive(Debug, Default)]
pub struct ChannelStateTable {
    slots: [Mutex<ChannelState>; HardwareKey::COUNT],
}

impl ChannelStateTable {
    /// A table with every channel stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `key`'s slot until the guard is dropped.
    pub(crate) fn lock(&self, key: HardwareKey) -> ChannelGuard<'_> {
        ChannelGuard {
            key,
            state: self.slots[key.index()].lock(),
        }
    }

    pub fn get(&self, key: HardwareKey) -> ChannelState {
        self.lock(key).get()
    }

    /// Keys currently recorded as running, in index order.
    pub fn exported(&self) -> Vec<HardwareKey> {
        HardwareKey::all()
            .filter(|&key| self.get(key).is_exported())
            .collect()
    }
}
