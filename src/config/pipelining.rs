use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigValidationError;

/// Spec §3 "Request fingerprint (pipelined mode)", §4.6, §6 `pipelining`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PipeliningConfig {
    /// Serial mode: at most one outstanding request (spec §4.6).
    Disabled,
    Enabled {
        max_in_flight: usize,
        #[serde(with = "humantime_serde")]
        request_timeout: Duration,
    },
}

impl Default for PipeliningConfig {
    fn default() -> Self {
        Self::Disabled
    }
}

impl PipeliningConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Self::Enabled {
            max_in_flight,
            request_timeout,
        } = self
        {
            if *max_in_flight == 0 {
                return Err(ConfigValidationError::config(
                    "pipelining max_in_flight cannot be 0",
                ));
            }
            if request_timeout.is_zero() {
                return Err(ConfigValidationError::config(
                    "pipelining request_timeout cannot be 0",
                ));
            }
        }
        Ok(())
    }
}
