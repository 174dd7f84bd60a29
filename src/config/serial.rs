use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{DataBits, Parity, StopBits};
use crate::errors::ConfigValidationError;

/// Parameters for opening a POSIX serial device (spec §6 "Serial port
/// transport").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            read_timeout: Duration::from_millis(100),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.path.starts_with("/dev/") || self.path.split('/').any(|s| s == "..") {
            return Err(ConfigValidationError::config(format!(
                "serial path {} must start with /dev/ and contain no '..'",
                self.path
            )));
        }
        if self.baud_rate == 0 {
            return Err(ConfigValidationError::config("baud_rate cannot be 0"));
        }
        if self.read_timeout.is_zero() {
            return Err(ConfigValidationError::config("read_timeout cannot be 0"));
        }
        Ok(())
    }
}
