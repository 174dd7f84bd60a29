//! Byte-transport capability traits (spec §6, §9). The core never talks to
//! a socket or a device directly; it talks to whichever of these a caller
//! plugs in. Concrete transports are external collaborators specified by
//! interface only - except for the serial reference implementation below,
//! shipped the way the teacher ships its one concrete RTU transport,
//! feature-gated so the trait-only contract stays the default.

use std::time::Duration;

use crate::errors::TransportError;

#[cfg(feature = "serial")]
pub mod serial_port;

/// A connection-oriented byte stream (TCP, TLS). The core writes whole
/// ADUs and feeds whatever bytes arrive into its own frame decoder -
/// chunking is the transport's business, not the codec's.
pub trait StreamTransport: Send {
    fn connect(
        &mut self,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn write(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Reads whatever bytes are currently available into `buf`, returning
    /// the number read. Returning `Ok(0)` signals the peer closed the
    /// connection.
    fn read(&mut self, buf: &mut [u8]) -> impl std::future::Future<Output = Result<usize, TransportError>> + Send;

    fn close(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// A connectionless datagram transport (UDP). Every send/receive carries
/// one whole ADU; there is no partial-frame reassembly.
pub trait DatagramTransport: Send {
    fn send_to(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn receive_with_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<usize, TransportError>> + Send;

    fn close(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// A POSIX-style serial device. `flush` discards stale input/output
/// buffers, not just pending writes - the serial transaction primitive
/// relies on this to recover from an aborted previous exchange (spec §4.7).
pub trait SerialTransport: Send {
    fn write(
        &mut self,
        bytes: &[u8],
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn read(
        &mut self,
        max_bytes: usize,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, TransportError>> + Send;

    fn flush(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn close(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// Validates a serial device path per spec §6: must start with `/dev/` and
/// must not contain a `..` traversal segment.
pub fn validate_serial_path(path: &str) -> Result<(), TransportError> {
    if !path.starts_with("/dev/") {
        return Err(TransportError::ConnectFailed(format!(
            "serial path {path} must start with /dev/"
        )));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(TransportError::ConnectFailed(format!(
            "serial path {path} must not contain '..'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_dev_path() {
        assert!(validate_serial_path("/dev/ttyUSB0").is_ok());
    }

    #[test]
    fn rejects_path_outside_dev() {
        assert!(validate_serial_path("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_traversal_segments() {
        assert!(validate_serial_path("/dev/../etc/passwd").is_err());
    }
}
