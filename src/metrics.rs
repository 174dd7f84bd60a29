//! Optional metrics sink (spec §6). The core only defines the trait and
//! the metric names it calls out on; wiring to Prometheus, StatsD, or
//! anything else is left to the caller, same as the byte transport.

use std::time::Duration;

/// Implemented by whatever the caller wires up to collect metrics.
/// `NoopMetrics` is used when no sink is configured.
pub trait MetricsSink: Send + Sync {
    fn request_completed(&self, function_code: u8, status: RequestStatus, duration: Duration);
    fn connection_opened(&self);
    fn connection_closed(&self);
    fn retry(&self);
    fn reconnection(&self);
    fn pipelining_pending(&self, count: usize);
    fn pipelining_timeout(&self);
    fn pipelining_backpressure(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Error,
}

/// Default sink: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn request_completed(&self, _function_code: u8, _status: RequestStatus, _duration: Duration) {}
    fn connection_opened(&self) {}
    fn connection_closed(&self) {}
    fn retry(&self) {}
    fn reconnection(&self) {}
    fn pipelining_pending(&self, _count: usize) {}
    fn pipelining_timeout(&self) {}
    fn pipelining_backpressure(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_every_call_without_panicking() {
        let sink = NoopMetrics;
        sink.request_completed(0x03, RequestStatus::Success, Duration::from_millis(5));
        sink.connection_opened();
        sink.connection_closed();
        sink.retry();
        sink.reconnection();
        sink.pipelining_pending(3);
        sink.pipelining_timeout();
        sink.pipelining_backpressure();
    }
}
