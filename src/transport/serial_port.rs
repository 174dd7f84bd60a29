//! Reference `SerialTransport` implementation over the `serialport` crate
//! (feature `serial`), grounded on the teacher's own RTU transport.

use std::time::Duration;

use serialport::SerialPort as _;
use tokio::sync::Mutex;

use crate::config::SerialPortConfig;
use crate::errors::{IoOperation, TransportError};

use super::{validate_serial_path, SerialTransport};

pub struct SerialPortTransport {
    port: Mutex<Box<dyn serialport::SerialPort>>,
}

impl SerialPortTransport {
    pub fn open(config: &SerialPortConfig) -> Result<Self, TransportError> {
        validate_serial_path(&config.path)?;
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.read_timeout)
            .open()?;
        Ok(Self {
            port: Mutex::new(port),
        })
    }
}

impl SerialTransport for SerialPortTransport {
    async fn write(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportError> {
        let mut port = self.port.lock().await;
        port.set_timeout(timeout).map_err(|e| TransportError::from(e))?;
        std::io::Write::write_all(&mut *port, bytes).map_err(|e| TransportError::Io {
            operation: IoOperation::Write,
            details: e.to_string(),
            source: e,
        })?;
        std::io::Write::flush(&mut *port).map_err(|e| TransportError::Io {
            operation: IoOperation::Write,
            details: e.to_string(),
            source: e,
        })
    }

    async fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut port = self.port.lock().await;
        port.set_timeout(timeout).map_err(TransportError::from)?;
        let mut buf = vec![0u8; max_bytes];
        match std::io::Read::read(&mut *port, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(TransportError::Io {
                operation: IoOperation::Read,
                details: e.to_string(),
                source: e,
            }),
        }
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        let mut port = self.port.lock().await;
        port.clear(serialport::ClearBuffer::All)
            .map_err(TransportError::from)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
