use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{PipeliningConfig, ReconnectionStrategy, TlsConfig};
use crate::errors::ConfigValidationError;

/// Recognized configuration options for a client façade (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub retries: u32,
    #[serde(with = "humantime_serde::option")]
    pub idle_timeout: Option<Duration>,
    pub reconnection: ReconnectionStrategy,
    pub pipelining: PipeliningConfig,
    /// Serial transports only; strips a half-duplex echo of the
    /// transmitted bytes from the read response (spec §4.7).
    pub handle_local_echo: bool,
    pub tls: Option<TlsConfig>,
    /// Default logical slave address when a request omits one (spec §6).
    pub default_unit_id: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            retries: 0,
            idle_timeout: None,
            reconnection: ReconnectionStrategy::default(),
            pipelining: PipeliningConfig::default(),
            handle_local_echo: false,
            tls: None,
            default_unit_id: 1,
        }
    }
}

impl Config {
    /// The teacher's RTU defaults of 3 retries and local-echo handling off
    /// by default (spec §6: "retries... default 0 for TCP, 3 for RTU").
    pub fn default_for_serial() -> Self {
        Self {
            retries: 3,
            handle_local_echo: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timeout.is_zero() {
            return Err(ConfigValidationError::config("timeout cannot be 0"));
        }
        if let Some(idle) = self.idle_timeout {
            if idle.is_zero() {
                return Err(ConfigValidationError::config(
                    "idle_timeout cannot be Some(0); omit it to disable",
                ));
            }
        }
        if !(1..=247).contains(&self.default_unit_id) {
            return Err(ConfigValidationError::config(format!(
                "default_unit_id {} must be 1..=247",
                self.default_unit_id
            )));
        }
        self.reconnection.validate()?;
        self.pipelining.validate()?;
        if let Some(tls) = &self.tls {
            tls.validate()?;
        }
        Ok(())
    }
}
