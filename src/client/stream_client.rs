//! The client façade for stream transports (TCP/TLS), spec §4.8: connection
//! lifecycle, retry, idle timeout, reconnection backoff, and cancellation,
//! layered on the MBAP framer and the serial/pipelined demultiplexer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::adu::mbap;
use crate::config::{ClientConfig, PipeliningConfig, ReconnectionStrategy};
use crate::errors::{ClientError, PduResult, TimingError, TransportError};
use crate::metrics::{MetricsSink, NoopMetrics, RequestStatus};
use crate::pdu::{
    device_identification, diagnostics, fifo, file_record, mask_write, read_bits, read_registers,
    read_write_registers, write_multiple, write_single,
};
use crate::transaction::demux::Demultiplexer;
use crate::transaction::stream_decoder::StreamFrameDecoder;
use crate::transport::StreamTransport;

use super::backoff::ReconnectBackoff;
use super::retry::with_retries;
use super::state::ConnectionState;
use super::transaction_id::TransactionIdGenerator;
use super::validate;

/// Fails the registered response slot when dropped without being disarmed
/// first (spec §5 "a cancelled wait always fails the registered slot
/// before returning"). `Drop` cannot await the demultiplexer's async lock,
/// so cancellation spawns a detached cleanup task instead of blocking.
struct SlotGuard {
    demux: Arc<Demultiplexer>,
    transaction_id: Option<u16>,
    armed: bool,
}

impl SlotGuard {
    fn new(demux: Arc<Demultiplexer>, transaction_id: Option<u16>) -> Self {
        Self {
            demux,
            transaction_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let demux = Arc::clone(&self.demux);
        let transaction_id = self.transaction_id;
        tokio::spawn(async move {
            match transaction_id {
                Some(id) => demux.cancel(id).await,
                None => demux.cancel_serial().await,
            }
        });
    }
}

pub struct StreamClient<T: StreamTransport + 'static> {
    transport: Arc<Mutex<T>>,
    state: Mutex<ConnectionState>,
    state_changed: Notify,
    demux: Arc<Demultiplexer>,
    tx_id: TransactionIdGenerator,
    backoff: Mutex<Option<ReconnectBackoff>>,
    config: ClientConfig,
    metrics: Arc<dyn MetricsSink>,
    last_activity: Mutex<Instant>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: StreamTransport + 'static> StreamClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_metrics(transport, config, Arc::new(NoopMetrics))
    }

    pub fn with_metrics(transport: T, config: ClientConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let demux = match config.pipelining {
            PipeliningConfig::Disabled => Demultiplexer::serial(),
            PipeliningConfig::Enabled { max_in_flight, .. } => Demultiplexer::pipelined(max_in_flight),
        };
        Self {
            transport: Arc::new(Mutex::new(transport)),
            state: Mutex::new(ConnectionState::Disconnected),
            state_changed: Notify::new(),
            demux: Arc::new(demux),
            tx_id: TransactionIdGenerator::new(),
            backoff: Mutex::new(None),
            config,
            metrics,
            last_activity: Mutex::new(Instant::now()),
            reader_task: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    /// Connects the transport, idempotent on an already-connected client.
    /// A concurrent `close` in progress is waited out before connecting
    /// (spec §4.8: "connect waits for a concurrent disconnecting to finish
    /// before entering connecting").
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

        let result = self.transport.lock().await.connect(self.config.timeout).await;
        let mut guard = self.state.lock().await;
        match result {
            Ok(()) => {
                *guard = ConnectionState::Connected;
                drop(guard);
                self.state_changed.notify_waiters();
                self.metrics.connection_opened();
                *self.reader_task.lock().await = Some(self.spawn_reader_task());
                *self.last_activity.lock().await = Instant::now();
                Ok(())
            }
            Err(err) => {
                *guard = ConnectionState::Disconnected;
                drop(guard);
                self.state_changed.notify_waiters();
                Err(err.into())
            }
        }
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

        if let Some(handle) = self.reader_task.lock().await.take() {
            handle.abort();
        }
        self.demux.close().await;
        let result = self.transport.lock().await.close().await;

        *self.state.lock().await = ConnectionState::Disconnected;
        self.state_changed.notify_waiters();
        self.metrics.connection_closed();
        result.map_err(ClientError::from)
    }

    fn spawn_reader_task(&self) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let demux = Arc::clone(&self.demux);
        tokio::spawn(async move {
            let mut decoder = StreamFrameDecoder::new();
            let mut buf = [0u8; 4096];
            loop {
                let read = {
                    let mut transport = transport.lock().await;
                    transport.read(&mut buf).await
                };
                match read {
                    Ok(0) => {
                        // Peer closed the stream. Any bytes still buffered in
                        // the decoder are an incomplete frame (spec §4.5) -
                        // fail whoever is waiting with that specific cause
                        // rather than a generic channel-closed error.
                        if let Err(err) = decoder.finish() {
                            demux.fail_all(err).await;
                        }
                        break;
                    }
                    Ok(n) => {
                        decoder.feed(&buf[..n]);
                        loop {
                            match decoder.next_frame() {
                                Ok(Some(frame)) => demux.complete(frame).await,
                                Ok(None) => break,
                                Err(_) => return, // malformed frame: terminal per spec §4.5
                            }
                        }
                    }
                    Err(_) => break,
                }
            }
            demux.close().await;
        })
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
        let pipelined = matches!(self.config.pipelining, PipeliningConfig::Enabled { .. });
        let slot_id = pipelined.then_some(transaction_id);

        let (rx, request_timeout) = match &self.config.pipelining {
            PipeliningConfig::Disabled => (self.demux.register_serial().await?, self.config.timeout),
            PipeliningConfig::Enabled { request_timeout, .. } => {
                (self.demux.register(transaction_id).await?, *request_timeout)
            }
        };
        let mut slot = SlotGuard::new(Arc::clone(&self.demux), slot_id);

        let adu = mbap::build(transaction_id, unit_id, request_pdu);
        if let Err(err) = self.transport.lock().await.write(&adu).await {
            *self.state.lock().await = ConnectionState::Disconnected;
            self.state_changed.notify_waiters();
            return Err(err.into());
        }
        self.touch_activity().await;

        let response = tokio::select! {
            result = rx => match result {
                Ok(Ok(frame)) => frame,
                Ok(Err(frame_err)) => return Err(frame_err.into()),
                Err(_) => return Err(TransportError::ChannelClosed.into()),
            },
            _ = tokio::time::sleep(request_timeout) => {
                return Err(TimingError::RequestTimeout(request_timeout).into());
            }
        };
        slot.disarm();
        self.touch_activity().await;

        let frame = mbap::parse(&response)?;
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
