//! Friendly name table
//!
//! Maps header pins and peripheral output names to [`HardwareKey`]s. Several
//! header pins are wired to the same output (EHRPWM2A is on both P8_19 and
//! P8_45), so the mapping is many-to-one.

use thiserror::Error;

use crate::HardwareKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown PWM channel {0:?}")]
    UnknownChannel(String),
}

/// Every accepted name, sorted by byte order so it can be binary searched.
static CHANNEL_NAMES: &[(&str, HardwareKey)] = &[
    ("ECAPPWM0", HardwareKey::ECAPPWM0),
    ("ECAPPWM2", HardwareKey::ECAPPWM2),
    ("EHRPWM0A", HardwareKey::EHRPWM0A),
    ("EHRPWM0B", HardwareKey::EHRPWM0B),
    ("EHRPWM1A", HardwareKey::EHRPWM1A),
    ("EHRPWM1B", HardwareKey::EHRPWM1B),
    ("EHRPWM2A", HardwareKey::EHRPWM2A),
    ("EHRPWM2B", HardwareKey::EHRPWM2B),
    ("P8_07", HardwareKey::TIMER4),
    ("P8_08", HardwareKey::TIMER7),
    ("P8_09", HardwareKey::TIMER5),
    ("P8_10", HardwareKey::TIMER6),
    ("P8_13", HardwareKey::EHRPWM2B),
    ("P8_19", HardwareKey::EHRPWM2A),
    ("P8_34", HardwareKey::EHRPWM1B),
    ("P8_36", HardwareKey::EHRPWM1A),
    ("P8_45", HardwareKey::EHRPWM2A),
    ("P8_46", HardwareKey::EHRPWM2B),
    ("P9_14", HardwareKey::EHRPWM1A),
    ("P9_16", HardwareKey::EHRPWM1B),
    ("P9_21", HardwareKey::EHRPWM0B),
    ("P9_22", HardwareKey::EHRPWM0A),
    ("P9_28", HardwareKey::ECAPPWM2),
    ("P9_29", HardwareKey::EHRPWM0B),
    ("P9_31", HardwareKey::EHRPWM0A),
    ("P9_42", HardwareKey::ECAPPWM0),
    ("TIMER4", HardwareKey::TIMER4),
    ("TIMER5", HardwareKey::TIMER5),
    ("TIMER6", HardwareKey::TIMER6),
    ("TIMER7", HardwareKey::TIMER7),
];

/// Resolve a header pin (`"P8_13"`) or peripheral output (`"EHRPWM2B"`) name.
///
/// Matching is exact and case-sensitive.
///
/// # Errors
/// Returns [`ResolveError::UnknownChannel`] if `name` is not in the table.
pub fn resolve(name: &str) -> Result<HardwareKey, ResolveError> {
    CHANNEL_NAMES
        .binary_search_by(|(candidate, _)| candidate.cmp(&name))
        .map(|idx| CHANNEL_NAMES[idx].1)
        .map_err(|_| ResolveError::UnknownChannel(name.to_owned()))
}

/// Every name [`resolve`] accepts.
pub fn names() -> impl Iterator<Item = &'static str> {
    CHANNEL_NAMES.iter().map(|(name, _)| *name)
}

/// Every name that resolves to `key`, the peripheral name included.
pub fn aliases(key: HardwareKey) -> impl Iterator<Item = &'static str> {
    CHANNEL_NAMES
        .iter()
        .filter(move |(_, k)| *k == key)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in CHANNEL_NAMES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} !< {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn every_name_resolves_to_its_entry() {
        for (name, key) in CHANNEL_NAMES {
            assert_eq!(resolve(name), Ok(*key));
        }
    }

    #[test]
    fn peripheral_name_is_always_an_alias() {
        for key in HardwareKey::all() {
            assert_eq!(resolve(key.name()), Ok(key));
            assert!(aliases(key).any(|n| n == key.name()));
        }
    }

    #[test]
    fn header_pins_alias_peripherals() {
        assert_eq!(resolve("P9_22").unwrap(), resolve("EHRPWM0A").unwrap());
        assert_eq!(resolve("P9_31").unwrap(), resolve("EHRPWM0A").unwrap());
        assert_eq!(resolve("P8_19").unwrap(), resolve("P8_45").unwrap());
        assert_eq!(resolve("P8_10").unwrap(), resolve("TIMER6").unwrap());
        assert_ne!(resolve("P8_13").unwrap(), resolve("P8_19").unwrap());

        let mut ehrpwm2a: Vec<_> = aliases(resolve("EHRPWM2A").unwrap()).collect();
        ehrpwm2a.sort_unstable();
        assert_eq!(ehrpwm2a, ["EHRPWM2A", "P8_19", "P8_45"]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        for name in ["", "p8_10", "P8_11", "P9_22 ", "ehrpwm0a", "EHRPWM3A", "GPIO1_18"] {
            assert_eq!(
                resolve(name),
                Err(ResolveError::UnknownChannel(name.to_owned())),
                "{name:?}"
            );
        }
    }

    #[test]
    fn names_covers_every_key() {
        for key in HardwareKey::all() {
            assert!(names().any(|n| resolve(n) == Ok(key)));
        }
        assert_eq!(names().count(), CHANNEL_NAMES.len());
    }
}
