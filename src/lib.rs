pub mod adu;
pub mod binary;
pub mod checksum;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod pdu;
pub mod transaction;
pub mod transport;

pub use client::{ConnectionState, DatagramClient, ReconnectBackoff, SerialClient, StreamClient};
pub use config::{ClientConfig, LoggingConfig, PipeliningConfig, ReconnectionStrategy};
pub use config::{DataBits, Parity, SerialPortConfig, StopBits, TlsConfig};
pub use errors::{
    BackoffError, BackpressureError, ClientError, ConfigValidationError, CorrelationError,
    DeviceExceptionError, ExceptionCode, FrameError, PduError, PduResult, TimingError,
    TransportError, ValidationError,
};
pub use metrics::{MetricsSink, NoopMetrics, RequestStatus};
pub use transport::{DatagramTransport, SerialTransport, StreamTransport};

#[cfg(feature = "serial")]
pub use transport::serial_port::SerialPortTransport;
