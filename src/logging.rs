//! Structured logging setup. The core itself only emits `tracing` events;
//! this module is an optional convenience for applications that want the
//! same subscriber the teacher's relay used, not something the core
//! depends on internally.

use time::UtcOffset;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::LoggingConfig;
use crate::errors::ConfigValidationError;

/// Installs a global `tracing` subscriber from `config`. Intended for
/// applications embedding this crate, not for the crate's own tests.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigValidationError> {
    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    let base_level = config.get_level_filter();
    let mut env_filter = EnvFilter::default().add_directive(base_level.into());

    if config.trace_frames {
        env_filter = env_filter
            .add_directive("modbus_client::pdu=trace".parse().unwrap())
            .add_directive("modbus_client::adu=trace".parse().unwrap());
    }

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_timer(timer)
        .with_filter(env_filter);

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| ConfigValidationError::config(format!("failed to initialize logging: {e}")))
}

/// Convenience entry point using [`LoggingConfig::default`].
pub fn init_default() -> Result<(), ConfigValidationError> {
    init(&LoggingConfig::default())
}
