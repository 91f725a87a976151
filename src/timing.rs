//! Frequency and duty cycle arithmetic.
//!
//! The kernel works in whole nanoseconds. Callers think in hertz and
//! percent. Everything is rounded to the nearest nanosecond.

use crate::{PwmError, Result};

pub const DEFAULT_FREQUENCY_HZ: f64 = 2000.0;
pub const DEFAULT_DUTY_CYCLE: f64 = 0.0;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// # Errors
/// [`PwmError::InvalidArgument`] unless `0.0 <= percent <= 100.0`.
pub fn check_duty_cycle(percent: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(PwmError::InvalidArgument(format!(
            "duty_cycle must have a value from 0.0 to 100.0, got {percent}"
        )));
    }
    Ok(percent)
}

/// Period for `frequency_hz`, in nanoseconds.
///
/// # Errors
/// [`PwmError::InvalidArgument`] unless `frequency_hz > 0.0` and the rounded
/// period is at least 1 ns and fits in a `u64`.
pub fn period_ns(frequency_hz: f64) -> Result<u64> {
    if frequency_hz.is_nan() || frequency_hz <= 0.0 {
        return Err(PwmError::InvalidArgument(format!(
            "frequency must be greater than 0.0, got {frequency_hz}"
        )));
    }

    let period = (NANOS_PER_SEC / frequency_hz).round();
    if period < 1.0 {
        return Err(PwmError::InvalidArgument(format!(
            "frequency {frequency_hz} Hz is too high: period rounds to 0 ns"
        )));
    }
    if period >= u64::MAX as f64 {
        return Err(PwmError::InvalidArgument(format!(
            "frequency {frequency_hz} Hz is too low: period does not fit in 64 bits"
        )));
    }
    Ok(period as u64)
}

/// Active time for `percent` of `period_ns`. Never exceeds `period_ns`.
pub fn duty_cycle_ns(period_ns: u64, percent: f64) -> u64 {
    let duty = (period_ns as f64 * percent / 100.0).round();
    (duty as u64).min(period_ns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_from_frequency() {
        assert_eq!(period_ns(100.0).unwrap(), 10_000_000);
        assert_eq!(period_ns(50.0).unwrap(), 20_000_000);
        assert_eq!(period_ns(DEFAULT_FREQUENCY_HZ).unwrap(), 500_000);
        assert_eq!(period_ns(1.0).unwrap(), 1_000_000_000);
        // 1e9 / 3 = 333_333_333.33..
        assert_eq!(period_ns(3.0).unwrap(), 333_333_333);
        // 1e9 / 7 = 142_857_142.857..
        assert_eq!(period_ns(7.0).unwrap(), 142_857_143);
    }

    #[test]
    fn period_rejects_bad_frequencies() {
        for hz in [0.0, -1.0, -0.0, f64::NAN, f64::NEG_INFINITY, f64::INFINITY, 3e9, 1e-12] {
            assert!(
                matches!(period_ns(hz), Err(PwmError::InvalidArgument(_))),
                "{hz}"
            );
        }
        // Rounds to exactly 1 ns.
        assert_eq!(period_ns(1.9e9).unwrap(), 1);
    }

    #[test]
    fn duty_cycle_from_percent() {
        assert_eq!(duty_cycle_ns(10_000_000, 50.0), 5_000_000);
        assert_eq!(duty_cycle_ns(10_000_000, 0.0), 0);
        assert_eq!(duty_cycle_ns(10_000_000, 100.0), 10_000_000);
        assert_eq!(duty_cycle_ns(333_333_333, 100.0), 333_333_333);
        assert_eq!(duty_cycle_ns(3, 50.0), 2);
    }

    #[test]
    fn duty_cycle_range_is_inclusive() {
        assert_eq!(check_duty_cycle(0.0).unwrap(), 0.0);
        assert_eq!(check_duty_cycle(100.0).unwrap(), 100.0);
        for percent in [-0.001, 100.001, 150.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(check_duty_cycle(percent), Err(PwmError::InvalidArgument(_))),
                "{percent}"
            );
        }
    }
}
