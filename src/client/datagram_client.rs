//! The client façade for datagram transports (UDP), spec §4.8 lifecycle
//! layered on MBAP framing, with atomic per-request capture rather than the
//! stream decoder's incremental reassembly (spec §4.3: "incremental frame
//! decoder (stream) or atomic datagram/RTU/ASCII capture") - one
//! `send_to`/`receive_with_timeout` pair per call, no background reader
//! task and no demultiplexer, since every datagram already carries one
//! whole ADU.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};

use crate::adu::mbap;
use crate::config::{ClientConfig, ReconnectionStrategy};
use crate::errors::{ClientError, PduResult, TransportError};
use crate::metrics::{MetricsSink, NoopMetrics, RequestStatus};
use crate::pdu::{
    device_identification, diagnostics, fifo, file_record, mask_write, read_bits, read_registers,
    read_write_registers, write_multiple, write_single,
};
use crate::transaction::stream_decoder::MAX_ADU_LEN;
use crate::transport::DatagramTransport;

use super::backoff::ReconnectBackoff;
use super::retry::with_retries;
use super::state::ConnectionState;
use super::transaction_id::TransactionIdGenerator;
use super::validate;

pub struct DatagramClient<T: DatagramTransport> {
    transport: Mutex<T>,
    state: Mutex<ConnectionState>,
    state_changed: Notify,
    tx_id: TransactionIdGenerator,
    backoff: Mutex<Option<ReconnectBackoff>>,
    config: ClientConfig,
    metrics: Arc<dyn MetricsSink>,
    last_activity: Mutex<Instant>,
}

impl<T: DatagramTransport> DatagramClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_metrics(transport, config, Arc::new(NoopMetrics))
    }

    pub fn with_metrics(transport: T, config: ClientConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            transport: Mutex::new(transport),
            state: Mutex::new(ConnectionState::Disconnected),
            state_changed: Notify::new(),
            tx_id: TransactionIdGenerator::new(),
            backoff: Mutex::new(None),
            config,
            metrics,
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    /// Marks the socket ready for traffic. A connectionless transport has
    /// nothing to dial - this only moves the state machine, so a concurrent
    /// `close` is still waited out first (spec §4.8).
    pub async fn connect(&self) -> Result<(), ClientError> {
        loop {
            let mut guard = self.state.lock().await;
            match *guard {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting | ConnectionState::Disconnecting => {
                    drop(guard);
                    self.state_changed.notified().await;
                    continue;
                }
                ConnectionState::Disconnected => {
                    *guard = ConnectionState::Connecting;
                    break;
                }
            }
        }

        *self.state.lock().await = ConnectionState::Connected;
        self.state_changed.notify_waiters();
        self.metrics.connection_opened();
        *self.last_activity.lock().await = Instant::now();
        Ok(())
    }

    /// Idempotent on an already-disconnected client (spec §8 "Idempotent
    /// shutdown").
    pub async fn close(&self) -> Result<(), ClientError> {
        {
            let mut guard = self.state.lock().await;
            match *guard {
                ConnectionState::Disconnected => return Ok(()),
                ConnectionState::Disconnecting => {
                    drop(guard);
                    self.state_changed.notified().await;
                    return Ok(());
                }
                _ => *guard = ConnectionState::Disconnecting,
            }
        }
        self.state_changed.notify_waiters();

        let result = self.transport.lock().await.close().await;

        *self.state.lock().await = ConnectionState::Disconnected;
        self.state_changed.notify_waiters();
        self.metrics.connection_closed();
        result.map_err(ClientError::from)
    }

    async fn touch_activity(&self) {
        *self.last_activity.lock().await = Instant::now();
    }

    /// Time since the last write/read, for an idle-timeout caller loop
    /// (spec §4.8 "Idle timeout") to compare against `config.idle_timeout`.
    pub async fn idle_for(&self) -> Duration {
        self.last_activity.lock().await.elapsed()
    }

    async fn call_pdu(&self, unit_id: u8, request_pdu: &[u8]) -> Result<Vec<u8>, ClientError> {
        {
            let guard = self.state.lock().await;
            if *guard != ConnectionState::Connected {
                return Err(TransportError::NotConnected.into());
            }
        }

        let transaction_id = self.tx_id.next();
        let adu = mbap::build(transaction_id, unit_id, request_pdu);

        let mut transport = self.transport.lock().await;
        if let Err(err) = transport.send_to(&adu).await {
            drop(transport);
            *self.state.lock().await = ConnectionState::Disconnected;
            self.state_changed.notify_waiters();
            return Err(err.into());
        }

        let mut buf = [0u8; MAX_ADU_LEN];
        let received = transport.receive_with_timeout(&mut buf, self.config.timeout).await;
        drop(transport);
        // `receive_with_timeout` owns the deadline itself (spec §6): a
        // timed-out wait is just another transport failure here, same
        // disconnect-and-propagate path as a send error.
        let n = match received {
            Ok(n) => n,
            Err(err) => {
                *self.state.lock().await = ConnectionState::Disconnected;
                self.state_changed.notify_waiters();
                return Err(err.into());
            }
        };
        self.touch_activity().await;

        let frame = mbap::parse(&buf[..n])?;
        mbap::correlate(&frame, transaction_id, unit_id)?;
        Ok(frame.pdu.to_vec())
    }

    async fn maybe_reconnect(&self, error: &ClientError) {
        if !matches!(error, ClientError::Transport(_)) {
            return;
        }
        match self.config.reconnection {
            ReconnectionStrategy::Disabled => {}
            ReconnectionStrategy::Immediate => {
                self.metrics.reconnection();
                let _ = self.connect().await;
            }
            ReconnectionStrategy::ExponentialBackoff { initial, max } => {
                let delay = {
                    let mut guard = self.backoff.lock().await;
                    let backoff = guard.get_or_insert_with(|| ReconnectBackoff::new(initial, max));
                    backoff.next_delay()
                };
                tokio::time::sleep(delay).await;
                self.metrics.reconnection();
                if self.connect().await.is_ok() {
                    if let Some(backoff) = self.backoff.lock().await.as_mut() {
                        backoff.reset();
                    }
                }
            }
        }
    }

    /// Validates, builds, sends and parses one request, with retry and
    /// reconnection per spec §4.8.
    async fn request<R>(
        &self,
        function_code: u8,
        request_pdu: Vec<u8>,
        parse: impl Fn(&[u8]) -> PduResult<R>,
    ) -> Result<R, ClientError> {
        let unit_id = self.config.default_unit_id;
        let started = Instant::now();
        let outcome = with_retries(
            self.config.retries,
            |_attempt| {
                let request_pdu = &request_pdu;
                async move {
                    let response_pdu = self.call_pdu(unit_id, request_pdu).await?;
                    parse(&response_pdu).map_err(ClientError::from)
                }
            },
            |err| {
                self.metrics.retry();
                self.maybe_reconnect(err)
            },
        )
        .await;

        self.metrics.request_completed(
            function_code,
            if outcome.is_ok() {
                RequestStatus::Success
            } else {
                RequestStatus::Error
            },
            started.elapsed(),
        );
        outcome
    }

    pub async fn read_coils(&self, address: u16, quantity: u16) -> Result<Vec<bool>, ClientError> {
        validate::bit_read_quantity(quantity)?;
        let pdu = read_bits::build_request(0x01, read_bits::ReadBitsRequest { address, quantity });
        self.request(0x01, pdu, move |resp| {
            read_bits::parse_response(0x01, resp, quantity).map(|r| r.bits)
        })
        .await
    }

    pub async fn read_discrete_inputs(&self, address: u16, quantity: u16) -> Result<Vec<bool>, ClientError> {
        validate::bit_read_quantity(quantity)?;
        let pdu = read_bits::build_request(0x02, read_bits::ReadBitsRequest { address, quantity });
        self.request(0x02, pdu, move |resp| {
            read_bits::parse_response(0x02, resp, quantity).map(|r| r.bits)
        })
        .await
    }

    pub async fn read_holding_registers(&self, address: u16, quantity: u16) -> Result<Vec<u16>, ClientError> {
        validate::register_read_quantity(quantity)?;
        let pdu = read_registers::build_request(
            0x03,
            read_registers::ReadRegistersRequest { address, quantity },
        );
        self.request(0x03, pdu, |resp| {
            read_registers::parse_response(0x03, resp).map(|r| r.registers)
        })
        .await
    }

    pub async fn read_input_registers(&self, address: u16, quantity: u16) -> Result<Vec<u16>, ClientError> {
        validate::register_read_quantity(quantity)?;
        let pdu = read_registers::build_request(
            0x04,
            read_registers::ReadRegistersRequest { address, quantity },
        );
        self.request(0x04, pdu, |resp| {
            read_registers::parse_response(0x04, resp).map(|r| r.registers)
        })
        .await
    }

    pub async fn write_single_coil(&self, address: u16, value: bool) -> Result<(), ClientError> {
        let pdu = write_single::build_request(
            0x05,
            write_single::WriteSingleRequest {
                address,
                value: write_single::coil_value(value),
            },
        );
        self.request(0x05, pdu, |resp| write_single::parse_response(0x05, resp).map(|_| ()))
            .await
    }

    pub async fn write_single_register(&self, address: u16, value: u16) -> Result<(), ClientError> {
        let pdu = write_single::build_request(0x06, write_single::WriteSingleRequest { address, value });
        self.request(0x06, pdu, |resp| write_single::parse_response(0x06, resp).map(|_| ()))
            .await
    }

    pub async fn write_multiple_coils(&self, address: u16, values: &[bool]) -> Result<u16, ClientError> {
        validate::non_empty(values, "coil values")?;
        validate::coil_write_quantity(values.len() as u16)?;
        let pdu = write_multiple::build_coils_request(address, values);
        self.request(0x0F, pdu, |resp| {
            write_multiple::parse_response(0x0F, resp).map(|r| r.quantity)
        })
        .await
    }

    pub async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> Result<u16, ClientError> {
        validate::non_empty(values, "register values")?;
        validate::register_write_quantity(values.len() as u16)?;
        let pdu = write_multiple::build_registers_request(address, values);
        self.request(0x10, pdu, |resp| {
            write_multiple::parse_response(0x10, resp).map(|r| r.quantity)
        })
        .await
    }

    pub async fn mask_write_register(&self, address: u16, and_mask: u16, or_mask: u16) -> Result<(), ClientError> {
        let pdu = mask_write::build_request(mask_write::MaskWriteRequest {
            address,
            and_mask,
            or_mask,
        });
        self.request(0x16, pdu, |resp| mask_write::parse_response(resp).map(|_| ()))
            .await
    }

    pub async fn read_write_multiple_registers(
        &self,
        read_address: u16,
        read_quantity: u16,
        write_address: u16,
        write_values: &[u16],
    ) -> Result<Vec<u16>, ClientError> {
        validate::non_empty(write_values, "write register values")?;
        validate::read_write_quantities(read_quantity, write_values.len() as u16)?;
        let req = read_write_registers::ReadWriteRequest {
            read_address,
            read_quantity,
            write_address,
            write_values: write_values.to_vec(),
        };
        let pdu = read_write_registers::build_request(&req);
        self.request(0x17, pdu, |resp| {
            read_write_registers::parse_response(resp).map(|r| r.registers)
        })
        .await
    }

    pub async fn read_fifo_queue(&self, address: u16) -> Result<Vec<u16>, ClientError> {
        let pdu = fifo::build_request(address);
        self.request(0x18, pdu, |resp| fifo::parse_response(resp).map(|r| r.values))
            .await
    }

    pub async fn read_exception_status(&self) -> Result<u8, ClientError> {
        let pdu = diagnostics::build_read_exception_status_request();
        self.request(diagnostics::READ_EXCEPTION_STATUS, pdu, |resp| {
            diagnostics::parse_read_exception_status_response(resp)
        })
        .await
    }

    pub async fn diagnostics_echo(
        &self,
        sub_function: u16,
        data: u16,
    ) -> Result<diagnostics::DiagnosticsMessage, ClientError> {
        let pdu = diagnostics::build_diagnostics_request(diagnostics::DiagnosticsMessage {
            sub_function,
            data,
        });
        self.request(diagnostics::DIAGNOSTICS, pdu, diagnostics::parse_diagnostics_response)
            .await
    }

    pub async fn get_comm_event_counter(&self) -> Result<diagnostics::CommEventCounter, ClientError> {
        let pdu = diagnostics::build_comm_event_counter_request();
        self.request(
            diagnostics::GET_COMM_EVENT_COUNTER,
            pdu,
            diagnostics::parse_comm_event_counter_response,
        )
        .await
    }

    pub async fn get_comm_event_log(&self) -> Result<diagnostics::CommEventLog, ClientError> {
        let pdu = diagnostics::build_comm_event_log_request();
        self.request(
            diagnostics::GET_COMM_EVENT_LOG,
            pdu,
            diagnostics::parse_comm_event_log_response,
        )
        .await
    }

    pub async fn read_file_record(
        &self,
        entries: &[file_record::FileRecordRequestEntry],
    ) -> Result<Vec<file_record::FileRecordReadEntry>, ClientError> {
        validate::non_empty(entries, "file record request entries")?;
        let pdu = file_record::build_read_request(entries);
        self.request(file_record::READ_FILE_RECORD, pdu, file_record::parse_read_response)
            .await
    }

    pub async fn write_file_record(
        &self,
        entries: &[file_record::FileRecordWriteEntry],
    ) -> Result<Vec<file_record::FileRecordWriteEntry>, ClientError> {
        validate::non_empty(entries, "file record write entries")?;
        let pdu = file_record::build_write_request(entries)?;
        self.request(file_record::WRITE_FILE_RECORD, pdu, file_record::parse_write_response)
            .await
    }

    pub async fn read_device_identification(
        &self,
        read_code: device_identification::ReadDeviceIdCode,
        object_id: u8,
    ) -> Result<device_identification::DeviceIdResponse, ClientError> {
        let pdu = device_identification::build_request(device_identification::DeviceIdRequest {
            read_code,
            object_id,
        });
        self.request(
            device_identification::ENCAPSULATED_INTERFACE_TRANSPORT,
            pdu,
            device_identification::parse_response,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// A fake socket that replies to each `receive_with_timeout` with the
    /// next queued datagram. `send_to` can be made to fail once to exercise
    /// the disconnect-on-send-error path.
    struct QueuedSocket {
        datagrams: StdMutex<VecDeque<Vec<u8>>>,
        sent: StdMutex<Vec<Vec<u8>>>,
        fail_next_send: StdMutex<bool>,
    }

    impl QueuedSocket {
        fn new(datagrams: Vec<Vec<u8>>) -> Self {
            Self {
                datagrams: StdMutex::new(datagrams.into()),
                sent: StdMutex::new(Vec::new()),
                fail_next_send: StdMutex::new(false),
            }
        }

        fn failing_send() -> Self {
            let socket = Self::new(Vec::new());
            *socket.fail_next_send.lock().unwrap() = true;
            socket
        }
    }

    impl DatagramTransport for QueuedSocket {
        async fn send_to(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if std::mem::take(&mut *self.fail_next_send.lock().unwrap()) {
                return Err(TransportError::ConnectFailed("simulated send failure".into()));
            }
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        async fn receive_with_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, TransportError> {
            match self.datagrams.lock().unwrap().pop_front() {
                Some(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                None => Err(TransportError::Io {
                    operation: crate::errors::IoOperation::Read,
                    details: "no datagram queued".into(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, "no datagram queued"),
                }),
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn datagram_response(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Vec<u8> {
        mbap::build(transaction_id, unit_id, pdu)
    }

    #[tokio::test(start_paused = true)]
    async fn reads_holding_registers_over_udp() {
        let mut pdu = vec![0x03];
        pdu.extend_from_slice(&read_registers::build_response(&[0x002A]));
        let socket = QueuedSocket::new(vec![datagram_response(0, 1, &pdu)]);
        let client = DatagramClient::new(socket, ClientConfig::default_for_serial());

        client.connect().await.unwrap();
        let registers = client.read_holding_registers(0x6B, 1).await.unwrap();
        assert_eq!(registers, vec![0x002A]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_is_idempotent() {
        let socket = QueuedSocket::new(Vec::new());
        let client = DatagramClient::new(socket, ClientConfig::default_for_serial());
        client.connect().await.unwrap();
        client.close().await.unwrap();
        client.close().await.unwrap();
        assert_eq!(client.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn request_before_connect_fails_without_touching_the_socket() {
        let socket = QueuedSocket::new(Vec::new());
        let client = DatagramClient::new(socket, ClientConfig::default_for_serial());
        let err = client.read_holding_registers(0, 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(TransportError::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_disconnects_and_is_retryable() {
        let socket = QueuedSocket::failing_send();
        let mut config = ClientConfig::default_for_serial();
        config.retries = 0;
        let client = DatagramClient::new(socket, config);
        client.connect().await.unwrap();

        let err = client.read_holding_registers(0, 1).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(client.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_transaction_id_is_a_correlation_error() {
        let mut pdu = vec![0x03];
        pdu.extend_from_slice(&read_registers::build_response(&[0x0001]));
        // Transaction ID 7 doesn't match what the generator will assign (0).
        let socket = QueuedSocket::new(vec![datagram_response(7, 1, &pdu)]);
        let mut config = ClientConfig::default_for_serial();
        config.retries = 0;
        let client = DatagramClient::new(socket, config);
        client.connect().await.unwrap();

        let err = client.read_holding_registers(0x6B, 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Correlation(_)));
    }
}
