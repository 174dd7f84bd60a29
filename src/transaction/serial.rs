//! Serial transaction primitive (spec §4.7): flush, write, wait T3.5, read
//! until silence, optionally strip a half-duplex echo. One call here is one
//! atomic exchange under the serial port's exclusive lock; the caller is
//! responsible for holding that lock for the call's duration.

use std::time::Duration;

use crate::adu::rtu::MAX_FRAME_LEN;
use crate::errors::TransportError;
use crate::transport::SerialTransport;

/// 11 bits per character (start + 8 data + parity + stop) is the
/// conservative Modbus convention regardless of the port's actual parity
/// setting (spec §4.7 / §9.8).
const BITS_PER_CHARACTER: u32 = 11;

/// Above this baud rate T3.5 is a fixed 1.750 ms rather than a scaled
/// character time (spec §9.8).
const T35_FIXED_THRESHOLD_BAUD: u32 = 19200;

/// The T3.5 inter-frame/inter-character delay for a given baud rate.
pub fn t35_delay(baud_rate: u32) -> Duration {
    if baud_rate == 0 || baud_rate > T35_FIXED_THRESHOLD_BAUD {
        return Duration::from_micros(1750);
    }
    let character_time = Duration::from_secs_f64(BITS_PER_CHARACTER as f64 / baud_rate as f64);
    character_time.mul_f64(3.5)
}

#[derive(Debug, Clone, Copy)]
pub struct SerialTransactionConfig {
    pub baud_rate: u32,
    pub response_timeout: Duration,
    pub handle_local_echo: bool,
}

/// Runs one request/response exchange over `transport` per spec §4.7.
pub async fn execute<T: SerialTransport>(
    transport: &mut T,
    request: &[u8],
    config: &SerialTransactionConfig,
) -> Result<Vec<u8>, TransportError> {
    transport.flush().await?;
    transport.write(request, config.response_timeout).await?;

    let inter_character_timeout = t35_delay(config.baud_rate);
    tokio::time::sleep(inter_character_timeout).await;

    let mut buffer = Vec::new();
    let mut first_chunk = true;
    while buffer.len() < MAX_FRAME_LEN {
        let timeout = if first_chunk {
            config.response_timeout
        } else {
            inter_character_timeout
        };
        first_chunk = false;

        let chunk = transport
            .read(MAX_FRAME_LEN - buffer.len(), timeout)
            .await?;
        if chunk.is_empty() {
            break;
        }
        buffer.extend_from_slice(&chunk);
    }

    if config.handle_local_echo && buffer.len() >= request.len() && buffer[..request.len()] == *request
    {
        buffer.drain(..request.len());
    }

    Ok(buffer)
}

/// Reads one ASCII frame (spec §4.7): byte-at-a-time until the CR LF
/// terminator, each byte gated by the per-character timeout. Writing and
/// echo-stripping follow the same shape as [`execute`].
pub async fn execute_ascii<T: SerialTransport>(
    transport: &mut T,
    request: &[u8],
    config: &SerialTransactionConfig,
) -> Result<Vec<u8>, TransportError> {
    use crate::adu::ascii::{CR, LF, MAX_FRAME_LEN as ASCII_MAX_FRAME_LEN};

    transport.flush().await?;
    transport.write(request, config.response_timeout).await?;

    let inter_character_timeout = t35_delay(config.baud_rate);

    let mut buffer = Vec::new();
    let mut first_byte = true;
    while buffer.len() < ASCII_MAX_FRAME_LEN {
        let timeout = if first_byte {
            config.response_timeout
        } else {
            inter_character_timeout
        };
        first_byte = false;

        let chunk = transport.read(1, timeout).await?;
        if chunk.is_empty() {
            break;
        }
        buffer.extend_from_slice(&chunk);
        if buffer.len() >= 2 && buffer[buffer.len() - 2] == CR && buffer[buffer.len() - 1] == LF {
            break;
        }
    }

    if config.handle_local_echo && buffer.len() >= request.len() && buffer[..request.len()] == *request
    {
        buffer.drain(..request.len());
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tokio::time::Instant;

    #[test]
    fn t35_is_scaled_character_time_at_low_baud() {
        let delay = t35_delay(9600);
        // 3.5 * 11 bits / 9600 baud ~= 4.01 ms
        assert!(delay > Duration::from_millis(3) && delay < Duration::from_millis(5));
    }

    #[test]
    fn t35_is_fixed_above_19200_baud() {
        assert_eq!(t35_delay(115200), Duration::from_micros(1750));
    }

    /// A fake serial port whose `read` replies with pre-scripted chunks,
    /// each released only once the simulated clock reaches the chunk's
    /// scheduled arrival time. Driven entirely by `tokio::time::pause`ed
    /// virtual time so the test is deterministic.
    struct ScriptedPort {
        writes: StdMutex<Vec<u8>>,
        chunks: StdMutex<VecDeque<(Duration, Vec<u8>)>>,
        start: Instant,
    }

    impl ScriptedPort {
        fn new(chunks: Vec<(Duration, Vec<u8>)>) -> Self {
            Self {
                writes: StdMutex::new(Vec::new()),
                chunks: StdMutex::new(chunks.into()),
                start: tokio::time::Instant::now(),
            }
        }
    }

    impl SerialTransport for ScriptedPort {
        async fn write(&mut self, bytes: &[u8], _timeout: Duration) -> Result<(), TransportError> {
            self.writes.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }

        async fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
            let deadline = Instant::now() + timeout;
            loop {
                let due = {
                    let chunks = self.chunks.lock().unwrap();
                    chunks.front().map(|(at, _)| *at)
                };
                match due {
                    Some(at) if Instant::now() >= self.start + at => {
                        let mut chunks = self.chunks.lock().unwrap();
                        let (_, bytes) = chunks.pop_front().unwrap();
                        return Ok(bytes.into_iter().take(max_bytes).collect());
                    }
                    _ => {
                        if Instant::now() >= deadline {
                            return Ok(Vec::new());
                        }
                        tokio::time::sleep(Duration::from_micros(50)).await;
                        if Instant::now() >= deadline {
                            return Ok(Vec::new());
                        }
                    }
                }
            }
        }

        async fn flush(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn fast_config() -> SerialTransactionConfig {
        SerialTransactionConfig {
            baud_rate: 0, // forces the fixed 1.75ms T3.5 used by the scenario
            response_timeout: Duration::from_millis(50),
            handle_local_echo: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_within_t35_gap_form_one_frame() {
        let mut port = ScriptedPort::new(vec![
            (Duration::from_micros(0), vec![0x01, 0x03, 0x02]),
            (Duration::from_micros(300), vec![0xAA, 0xBB, 0x00, 0x00, 0x00]),
        ]);

        let response = execute(&mut port, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01], &fast_config())
            .await
            .unwrap();

        assert_eq!(response, vec![0x01, 0x03, 0x02, 0xAA, 0xBB, 0x00, 0x00, 0x00]);
    }

    #[tokio::test(start_paused = true)]
    async fn gap_exceeding_t35_ends_the_frame_early() {
        let mut port = ScriptedPort::new(vec![
            (Duration::from_micros(0), vec![0x01, 0x03, 0x02]),
            (Duration::from_millis(10), vec![0xAA, 0xBB, 0x00, 0x00, 0x00]),
        ]);

        let response = execute(&mut port, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01], &fast_config())
            .await
            .unwrap();

        assert_eq!(response, vec![0x01, 0x03, 0x02]);
    }

    #[tokio::test(start_paused = true)]
    async fn local_echo_prefix_is_stripped() {
        let request = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        let mut reply = request.clone();
        reply.extend_from_slice(&[0x01, 0x03, 0x02, 0x00, 0x01]);

        let mut port = ScriptedPort::new(vec![(Duration::from_micros(0), reply)]);
        let config = SerialTransactionConfig {
            handle_local_echo: true,
            ..fast_config()
        };

        let response = execute(&mut port, &request, &config).await.unwrap();
        assert_eq!(response, vec![0x01, 0x03, 0x02, 0x00, 0x01]);
    }
}
