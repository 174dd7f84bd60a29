use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigValidationError;

/// Spec §4.8, §6 `reconnectionStrategy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ReconnectionStrategy {
    /// A request on a disconnected client fails with `not-connected`.
    Disabled,
    /// Reconnect once, then retry the request.
    Immediate,
    /// Wait `initial`, doubling up to `max` on each further failure; reset
    /// to `initial` after the first successful operation.
    ExponentialBackoff {
        #[serde(with = "humantime_serde")]
        initial: Duration,
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
}

impl Default for ReconnectionStrategy {
    fn default() -> Self {
        Self::Disabled
    }
}

impl ReconnectionStrategy {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Self::ExponentialBackoff { initial, max } = self {
            if initial.is_zero() {
                return Err(ConfigValidationError::config(
                    "reconnection backoff initial interval cannot be 0",
                ));
            }
            if max < initial {
                return Err(ConfigValidationError::config(
                    "reconnection backoff max interval cannot be less than initial",
                ));
            }
        }
        Ok(())
    }
}
