//! Mock PWM driver for testing
//!
//! [`MockDriver`] keeps a simulated copy of every output's sysfs attributes,
//! applies the same rule the kernel does (`duty_cycle <= period`, writes only
//! to exported outputs) and records every call in order. Like the sysfs
//! driver, exporting an already exported output disables it and zeroes its
//! duty cycle but keeps its period and polarity.
//!
//! # Feature Gate
//!
//! Available in this crate's own tests and to other crates with the `mock`
//! feature enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use bbpwm_board::resolve;
//! use bbpwm_driver::mock::{Call, MockDriver, Op};
//! use bbpwm_driver::PwmDriver;
//!
//! let driver = MockDriver::new();
//! let key = resolve("P9_14").unwrap();
//!
//! driver.export_channel(key).unwrap();
//! driver.write_period(key, 1_000).unwrap();
//! assert!(driver.write_duty_cycle(key, 2_000).is_err());
//!
//! driver.fail_on(Op::Enable, key);
//! assert!(driver.set_enabled(key, true).is_err());
//! assert_eq!(driver.calls()[0], Call::Export(key));
//! ```

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use bbpwm_board::HardwareKey;
use spin::Mutex;

use crate::{DriverError, Polarity, PwmDriver};

/// Operation kinds, for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Export,
    Unexport,
    Period,
    DutyCycle,
    Polarity,
    Enable,
}

/// One recorded driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Export(HardwareKey),
    Unexport(HardwareKey),
    Period(HardwareKey, u64),
    DutyCycle(HardwareKey, u64),
    Polarity(HardwareKey, Polarity),
    Enable(HardwareKey, bool),
}

impl Call {
    pub fn key(&self) -> HardwareKey {
        match *self {
            Call::Export(key)
            | Call::Unexport(key)
            | Call::Period(key, _)
            | Call::DutyCycle(key, _)
            | Call::Polarity(key, _)
            | Call::Enable(key, _) => key,
        }
    }
}

/// Simulated attributes of one output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockOutput {
    pub exported: bool,
    pub period_ns: u64,
    pub duty_cycle_ns: u64,
    pub polarity: Polarity,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct MockState {
    outputs: [MockOutput; HardwareKey::COUNT],
    calls: Vec<Call>,
    failures: HashSet<(Op, HardwareKey)>,
    strict_unexport: bool,
}

/// Recording, fault-injecting [`PwmDriver`].
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unexport of an output that is not exported, instead of
    /// treating it as success.
    pub fn strict_unexport(self) -> Self {
        self.state.lock().strict_unexport = true;
        self
    }

    /// Make every future `op` on `key` fail with an I/O error.
    pub fn fail_on(&self, op: Op, key: HardwareKey) {
        self.state.lock().failures.insert((op, key));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Every call so far, including failed ones, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Calls so far that touched `key`.
    pub fn calls_for(&self, key: HardwareKey) -> Vec<Call> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.key() == key)
            .copied()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Current simulated attributes of `key`.
    pub fn output(&self, key: HardwareKey) -> MockOutput {
        self.state.lock().outputs[key.index()]
    }

    fn apply(
        &self,
        call: Call,
        op: Op,
        f: impl FnOnce(&mut MockOutput) -> io::Result<()>,
    ) -> Result<(), DriverError> {
        let key = call.key();
        let mut state = self.state.lock();
        state.calls.push(call);

        let path = attr_path(key, op);
        if state.failures.contains(&(op, key)) {
            return Err(DriverError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
            ));
        }

        let strict_unexport = state.strict_unexport;
        let output = &mut state.outputs[key.index()];
        let result = match op {
            Op::Export => {
                if output.exported {
                    output.enabled = false;
                    output.duty_cycle_ns = 0;
                } else {
                    *output = MockOutput {
                        exported: true,
                        ..MockOutput::default()
                    };
                }
                Ok(())
            }
            Op::Unexport if !output.exported && !strict_unexport => Ok(()),
            Op::Enable if !output.exported => f(output),
            _ if !output.exported => Err(io::Error::from(io::ErrorKind::NotFound)),
            _ => f(output),
        };
        result.map_err(|e| DriverError::io(path, e))
    }
}

fn attr_path(key: HardwareKey, op: Op) -> PathBuf {
    let attr = match op {
        Op::Export => "export",
        Op::Unexport => "unexport",
        Op::Period => "period",
        Op::DutyCycle => "duty_cycle",
        Op::Polarity => "polarity",
        Op::Enable => "enable",
    };
    PathBuf::from(format!("mock/{key}/{attr}"))
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

impl PwmDriver for MockDriver {
    fn export_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        self.apply(Call::Export(key), Op::Export, |_| Ok(()))
    }

    fn unexport_channel(&self, key: HardwareKey) -> Result<(), DriverError> {
        self.apply(Call::Unexport(key), Op::Unexport, |out| {
            if !out.exported {
                return Err(io::Error::from(io::ErrorKind::NotFound));
            }
            *out = MockOutput::default();
            Ok(())
        })
    }

    fn write_period(&self, key: HardwareKey, period_ns: u64) -> Result<(), DriverError> {
        self.apply(Call::Period(key, period_ns), Op::Period, |out| {
            if period_ns < out.duty_cycle_ns {
                return Err(invalid("period shorter than duty_cycle"));
            }
            out.period_ns = period_ns;
            Ok(())
        })
    }

    fn write_duty_cycle(&self, key: HardwareKey, duty_cycle_ns: u64) -> Result<(), DriverError> {
        self.apply(Call::DutyCycle(key, duty_cycle_ns), Op::DutyCycle, |out| {
            if duty_cycle_ns > out.period_ns {
                return Err(invalid("duty_cycle longer than period"));
            }
            out.duty_cycle_ns = duty_cycle_ns;
            Ok(())
        })
    }

    fn set_polarity(&self, key: HardwareKey, polarity: Polarity) -> Result<(), DriverError> {
        self.apply(Call::Polarity(key, polarity), Op::Polarity, |out| {
            if out.enabled {
                return Err(invalid("polarity change while enabled"));
            }
            out.polarity = polarity;
            Ok(())
        })
    }

    fn set_enabled(&self, key: HardwareKey, enabled: bool) -> Result<(), DriverError> {
        self.apply(Call::Enable(key, enabled), Op::Enable, |out| {
            match (out.exported, enabled) {
                (false, false) => Ok(()),
                (false, true) => Err(io::Error::from(io::ErrorKind::NotFound)),
                (true, true) if out.period_ns == 0 => Err(invalid("period not set")),
                (true, _) => {
                    out.enabled = enabled;
                    Ok(())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bbpwm_board::resolve;

    use super::*;

    fn key() -> HardwareKey {
        resolve("EHRPWM1A").unwrap()
    }

    #[test]
    fn records_calls_in_order() {
        let driver = MockDriver::new();
        let key = key();

        driver.export_channel(key).unwrap();
        driver.write_period(key, 1_000).unwrap();
        driver.write_duty_cycle(key, 500).unwrap();
        driver.set_enabled(key, true).unwrap();

        assert_eq!(
            driver.calls(),
            [
                Call::Export(key),
                Call::Period(key, 1_000),
                Call::DutyCycle(key, 500),
                Call::Enable(key, true),
            ]
        );
        let out = driver.output(key);
        assert!(out.exported && out.enabled);
        assert_eq!((out.period_ns, out.duty_cycle_ns), (1_000, 500));
    }

    #[test]
    fn enforces_duty_within_period() {
        let driver = MockDriver::new();
        let key = key();
        driver.export_channel(key).unwrap();
        driver.write_period(key, 1_000).unwrap();
        driver.write_duty_cycle(key, 800).unwrap();

        assert!(driver.write_duty_cycle(key, 1_001).is_err());
        assert!(driver.write_period(key, 799).is_err());
        assert_eq!(driver.output(key).period_ns, 1_000);
        assert_eq!(driver.output(key).duty_cycle_ns, 800);
    }

    #[test]
    fn writes_need_an_export() {
        let driver = MockDriver::new();
        let key = key();

        assert!(driver.write_period(key, 1_000).is_err());
        assert!(driver.set_enabled(key, true).is_err());
        driver.set_enabled(key, false).unwrap();
        driver.unexport_channel(key).unwrap();
    }

    #[test]
    fn export_resets_an_exported_output() {
        let driver = MockDriver::new();
        let key = key();
        driver.export_channel(key).unwrap();
        driver.write_period(key, 20_000).unwrap();
        driver.write_duty_cycle(key, 10_000).unwrap();
        driver.set_enabled(key, true).unwrap();

        driver.export_channel(key).unwrap();

        let out = driver.output(key);
        assert!(out.exported && !out.enabled);
        assert_eq!((out.period_ns, out.duty_cycle_ns), (20_000, 0));
        driver.write_period(key, 5_000).unwrap();
    }

    #[test]
    fn strict_unexport_rejects_unexported_channel() {
        let driver = MockDriver::new().strict_unexport();
        assert!(matches!(
            driver.unexport_channel(key()),
            Err(DriverError::Io { .. })
        ));
    }

    #[test]
    fn injected_failures_are_per_key_and_op() {
        let driver = MockDriver::new();
        let key = key();
        let other = resolve("EHRPWM1B").unwrap();
        driver.fail_on(Op::Export, key);

        assert!(driver.export_channel(key).is_err());
        driver.export_channel(other).unwrap();
        assert!(!driver.output(key).exported);

        driver.clear_failures();
        driver.export_channel(key).unwrap();
        assert!(driver.output(key).exported);
    }
}
