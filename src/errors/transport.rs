use thiserror::Error;

use super::IoOperation;

#[cfg(feature = "serial")]
use super::kinds::SerialErrorKind;

/// Failures originating at or below the byte-transport boundary
/// (spec §7, "Transport").
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("I/O error: {operation} failed - {details}")]
    Io {
        operation: IoOperation,
        details: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response channel closed")]
    ChannelClosed,

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    #[cfg(feature = "serial")]
    #[error("serial port error: {kind} on {port} - {details}")]
    Serial {
        kind: SerialErrorKind,
        port: String,
        details: String,
    },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => IoOperation::Read,
            std::io::ErrorKind::WriteZero => IoOperation::Write,
            _ => IoOperation::Control,
        };
        TransportError::Io {
            operation,
            details: err.to_string(),
            source: err,
        }
    }
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::NoDevice => TransportError::Serial {
                kind: SerialErrorKind::OpenFailed,
                port: err.to_string(),
                details: "device not found".into(),
            },
            serialport::ErrorKind::InvalidInput => TransportError::Serial {
                kind: SerialErrorKind::ConfigurationFailed,
                port: err.to_string(),
                details: "invalid configuration".into(),
            },
            serialport::ErrorKind::Io(io_err) => TransportError::Io {
                operation: match io_err {
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                        IoOperation::Configure
                    }
                    std::io::ErrorKind::TimedOut => IoOperation::Read,
                    std::io::ErrorKind::WriteZero => IoOperation::Write,
                    _ => IoOperation::Control,
                },
                details: err.description.clone(),
                source: std::io::Error::new(io_err, err.description),
            },
        }
    }
}
