use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// A PWM controller on the AM335x.
///
/// Each controller shows up as one `pwmchip` in the kernel's PWM class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Peripheral {
    /// Enhanced high-resolution PWM module 0
    Ehrpwm0,
    /// Enhanced high-resolution PWM module 1
    Ehrpwm1,
    /// Enhanced high-resolution PWM module 2
    Ehrpwm2,
    /// Enhanced capture module 0 in APWM mode
    Ecap0,
    /// Enhanced capture module 2 in APWM mode
    Ecap2,
    /// DMTimer 4 in PWM mode
    Timer4,
    /// DMTimer 5 in PWM mode
    Timer5,
    /// DMTimer 6 in PWM mode
    Timer6,
    /// DMTimer 7 in PWM mode
    Timer7,
}

impl Peripheral {
    pub const ALL: [Peripheral; 9] = [
        Peripheral::Ehrpwm0,
        Peripheral::Ehrpwm1,
        Peripheral::Ehrpwm2,
        Peripheral::Ecap0,
        Peripheral::Ecap2,
        Peripheral::Timer4,
        Peripheral::Timer5,
        Peripheral::Timer6,
        Peripheral::Timer7,
    ];

    /// Lower-case name, as used in configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            Peripheral::Ehrpwm0 => "ehrpwm0",
            Peripheral::Ehrpwm1 => "ehrpwm1",
            Peripheral::Ehrpwm2 => "ehrpwm2",
            Peripheral::Ecap0 => "ecap0",
            Peripheral::Ecap2 => "ecap2",
            Peripheral::Timer4 => "timer4",
            Peripheral::Timer5 => "timer5",
            Peripheral::Timer6 => "timer6",
            Peripheral::Timer7 => "timer7",
        }
    }
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown PWM peripheral")]
pub struct UnknownPeripheral;

impl FromStr for Peripheral {
    type Err = UnknownPeripheral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Peripheral::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or(UnknownPeripheral)
    }
}

struct Output {
    name: &'static str,
    peripheral: Peripheral,
    channel: u32,
}

static OUTPUTS: [Output; HardwareKey::COUNT] = [
    Output { name: "EHRPWM0A", peripheral: Peripheral::Ehrpwm0, channel: 0 },
    Output { name: "EHRPWM0B", peripheral: Peripheral::Ehrpwm0, channel: 1 },
    Output { name: "EHRPWM1A", peripheral: Peripheral::Ehrpwm1, channel: 0 },
    Output { name: "EHRPWM1B", peripheral: Peripheral::Ehrpwm1, channel: 1 },
    Output { name: "EHRPWM2A", peripheral: Peripheral::Ehrpwm2, channel: 0 },
    Output { name: "EHRPWM2B", peripheral: Peripheral::Ehrpwm2, channel: 1 },
    Output { name: "ECAPPWM0", peripheral: Peripheral::Ecap0, channel: 0 },
    Output { name: "ECAPPWM2", peripheral: Peripheral::Ecap2, channel: 0 },
    Output { name: "TIMER4", peripheral: Peripheral::Timer4, channel: 0 },
    Output { name: "TIMER5", peripheral: Peripheral::Timer5, channel: 0 },
    Output { name: "TIMER6", peripheral: Peripheral::Timer6, channel: 0 },
    Output { name: "TIMER7", peripheral: Peripheral::Timer7, channel: 0 },
];

/// One PWM-capable output of the board.
///
/// Keys are only handed out by this crate (through [`crate::resolve`] or
/// [`HardwareKey::all`]), so every key indexes a real output and
/// [`HardwareKey::index`] is always below [`HardwareKey::COUNT`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HardwareKey(u8);

impl HardwareKey {
    /// Number of addressable PWM outputs on the board.
    pub const COUNT: usize = 12;

    pub(crate) const EHRPWM0A: HardwareKey = HardwareKey(0);
    pub(crate) const EHRPWM0B: HardwareKey = HardwareKey(1);
    pub(crate) const EHRPWM1A: HardwareKey = HardwareKey(2);
    pub(crate) const EHRPWM1B: HardwareKey = HardwareKey(3);
    pub(crate) const EHRPWM2A: HardwareKey = HardwareKey(4);
    pub(crate) const EHRPWM2B: HardwareKey = HardwareKey(5);
    pub(crate) const ECAPPWM0: HardwareKey = HardwareKey(6);
    pub(crate) const ECAPPWM2: HardwareKey = HardwareKey(7);
    pub(crate) const TIMER4: HardwareKey = HardwareKey(8);
    pub(crate) const TIMER5: HardwareKey = HardwareKey(9);
    pub(crate) const TIMER6: HardwareKey = HardwareKey(10);
    pub(crate) const TIMER7: HardwareKey = HardwareKey(11);

    /// Every output of the board, in index order.
    pub fn all() -> impl DoubleEndedIterator<Item = HardwareKey> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(HardwareKey)
    }

    /// Dense index in `0..COUNT`, for table lookups.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Canonical peripheral output name, e.g. `"EHRPWM1B"`.
    pub fn name(self) -> &'static str {
        self.output().name
    }

    /// The controller this output belongs to.
    pub fn peripheral(self) -> Peripheral {
        self.output().peripheral
    }

    /// Channel number of this output within its controller.
    pub fn channel(self) -> u32 {
        self.output().channel
    }

    fn output(self) -> &'static Output {
        &OUTPUTS[self.0 as usize]
    }
}

impl fmt::Debug for HardwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardwareKey({})", self.name())
    }
}

impl fmt::Display for HardwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense() {
        for (i, key) in HardwareKey::all().enumerate() {
            assert_eq!(key.index(), i);
        }
        assert_eq!(HardwareKey::all().len(), HardwareKey::COUNT);
    }

    #[test]
    fn ehrpwm_outputs_share_a_controller() {
        assert_eq!(HardwareKey::EHRPWM1A.peripheral(), Peripheral::Ehrpwm1);
        assert_eq!(HardwareKey::EHRPWM1B.peripheral(), Peripheral::Ehrpwm1);
        assert_eq!(HardwareKey::EHRPWM1A.channel(), 0);
        assert_eq!(HardwareKey::EHRPWM1B.channel(), 1);
    }

    #[test]
    fn single_channel_controllers_use_channel_zero() {
        for key in [
            HardwareKey::ECAPPWM0,
            HardwareKey::ECAPPWM2,
            HardwareKey::TIMER4,
            HardwareKey::TIMER5,
            HardwareKey::TIMER6,
            HardwareKey::TIMER7,
        ] {
            assert_eq!(key.channel(), 0, "{key}");
        }
    }

    #[test]
    fn peripheral_names_round_trip() {
        for p in Peripheral::ALL {
            assert_eq!(p.name().parse::<Peripheral>(), Ok(p));
        }
        assert_eq!("EHRPWM0".parse::<Peripheral>(), Err(UnknownPeripheral));
        assert_eq!("pwm9".parse::<Peripheral>(), Err(UnknownPeripheral));
    }
}
