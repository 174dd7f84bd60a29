mod client;
mod logging;
mod pipelining;
mod reconnection;
mod serial;
mod tls;
mod types;

pub use client::Config as ClientConfig;
pub use logging::Config as LoggingConfig;
pub use pipelining::PipeliningConfig;
pub use reconnection::ReconnectionStrategy;
pub use serial::Config as SerialPortConfig;
pub use tls::{Config as TlsConfig, TlsVerification, TlsVersion};
pub use types::{DataBits, Parity, StopBits};
