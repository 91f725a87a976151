//! Write Ordering Tests
//!
//! The mock driver rejects any write that would leave the duty cycle longer
//! than the period, exactly as the kernel does. These tests move channels
//! across large period changes in both directions and check that every
//! intermediate write was accepted.

use bbpwm::{resolve, ChannelManager, HardwareKey};
use bbpwm_driver::mock::{Call, MockDriver};

fn assert_never_exceeds(calls: &[Call], key: HardwareKey) {
    let (mut period, mut duty) = (0u64, 0u64);
    for call in calls.iter().filter(|c| c.key() == key) {
        match *call {
            Call::Period(_, p) => period = p,
            Call::DutyCycle(_, d) => duty = d,
            Call::Export(_) | Call::Unexport(_) => (period, duty) = (0, 0),
            _ => {}
        }
        assert!(duty <= period, "{call:?} left duty {duty} > period {period}");
    }
}

#[test]
fn test_shrinking_period_writes_duty_first() {
    let pwm = ChannelManager::new(MockDriver::new());
    let key = resolve("P9_14").unwrap();
    // 1 ms period, 0.9 ms active.
    pwm.start("P9_14", 90.0, 1000.0).unwrap();
    pwm.driver().clear_calls();

    // 0.1 ms period: the old 0.9 ms duty would not fit.
    pwm.set_frequency("P9_14", 10_000.0).expect("shrink");

    assert_eq!(
        pwm.driver().calls(),
        [Call::DutyCycle(key, 90_000), Call::Period(key, 100_000)]
    );
}

#[test]
fn test_growing_period_writes_period_first() {
    let pwm = ChannelManager::new(MockDriver::new());
    let key = resolve("P9_14").unwrap();
    pwm.start("P9_14", 90.0, 10_000.0).unwrap();
    pwm.driver().clear_calls();

    pwm.set_frequency("P9_14", 100.0).expect("grow");

    assert_eq!(
        pwm.driver().calls(),
        [Call::Period(key, 10_000_000), Call::DutyCycle(key, 9_000_000)]
    );
}

#[test]
fn test_shrinking_period_where_old_duty_still_fits() {
    let pwm = ChannelManager::new(MockDriver::new());
    let key = resolve("P9_16").unwrap();
    // 1 ms period, 0.1 ms active; new period 0.5 ms still holds 0.1 ms.
    pwm.start("P9_16", 10.0, 1000.0).unwrap();
    pwm.driver().clear_calls();

    pwm.set_frequency("P9_16", 2000.0).expect("shrink");

    assert_eq!(
        pwm.driver().calls(),
        [Call::Period(key, 500_000), Call::DutyCycle(key, 50_000)]
    );
}

#[test]
fn test_restart_with_shorter_period() {
    let pwm = ChannelManager::new(MockDriver::new());
    let key = resolve("P8_34").unwrap();
    pwm.start("P8_34", 100.0, 50.0).unwrap();

    pwm.start("P8_34", 100.0, 50_000.0).expect("restart");

    let out = pwm.driver().output(key);
    assert_eq!((out.period_ns, out.duty_cycle_ns), (20_000, 20_000));
    assert_never_exceeds(&pwm.driver().calls(), key);
}

#[test]
fn test_frequency_sweep_never_violates_duty_within_period() {
    let pwm = ChannelManager::new(MockDriver::new());
    let key = resolve("EHRPWM2B").unwrap();
    pwm.start("EHRPWM2B", 100.0, 1.0).unwrap();

    let sweep = [1e6, 3.0, 250_000.0, 10.0, 7.0, 1e5, 2000.0, 1.0, 999_999.0];
    for (i, frequency) in sweep.into_iter().enumerate() {
        let duty = (i as f64 * 37.0) % 101.0;
        pwm.set_duty_cycle("EHRPWM2B", duty)
            .unwrap_or_else(|e| panic!("duty {duty}: {e}"));
        pwm.set_frequency("EHRPWM2B", frequency)
            .unwrap_or_else(|e| panic!("frequency {frequency}: {e}"));
    }

    assert_never_exceeds(&pwm.driver().calls(), key);
    let state = pwm.state("EHRPWM2B").unwrap();
    let out = pwm.driver().output(key);
    assert_eq!(state.period_ns(), Some(out.period_ns));
    assert_eq!(state.duty_cycle_ns(), Some(out.duty_cycle_ns));
}
