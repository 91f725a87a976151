use std::io;
use std::path::PathBuf;
use std::time::Duration;

use bbpwm_board::HardwareKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i/o error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no pwmchip is configured for {peripheral} ({0})", peripheral = .0.peripheral())]
    Unmapped(HardwareKey),
    #[error("{} did not appear within {timeout:?} of export", .path.display())]
    ExportTimeout { path: PathBuf, timeout: Duration },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),
    #[error("unknown PWM peripheral {0:?} in [chips]")]
    UnknownPeripheral(String),
}
