//! Response demultiplexer (spec §4.6): matches arriving frames to the
//! caller awaiting them. Two modes, selected at connection time: *serial*
//! (one outstanding request) and *pipelined* (many, matched by Transaction
//! ID, bounded by `maxInFlight`).
//!
//! Registration must happen before the request bytes are written - the
//! response can race ahead of the caller reaching its `await` - so callers
//! call `register`/`register_serial` first and write second.

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use crate::binary;
use crate::errors::{BackpressureError, FrameError};

type Slot = oneshot::Sender<Result<Vec<u8>, FrameError>>;

enum Inner {
    Serial(Option<Slot>),
    Pipelined {
        max_in_flight: usize,
        pending: HashMap<u16, Slot>,
    },
}

/// Owns the pending-response state for one transport. Accessed only while
/// holding the internal lock (spec §5).
pub struct Demultiplexer {
    inner: Mutex<Inner>,
}

impl Demultiplexer {
    pub fn serial() -> Self {
        Self {
            inner: Mutex::new(Inner::Serial(None)),
        }
    }

    pub fn pipelined(max_in_flight: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::Pipelined {
                max_in_flight,
                pending: HashMap::new(),
            }),
        }
    }

    /// Registers the single serial slot. Fails if one is already pending -
    /// serial mode allows at most one outstanding request.
    pub async fn register_serial(
        &self,
    ) -> Result<oneshot::Receiver<Result<Vec<u8>, FrameError>>, BackpressureError> {
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Inner::Serial(slot) => {
                if slot.is_some() {
                    return Err(BackpressureError::TooManyPending);
                }
                let (tx, rx) = oneshot::channel();
                *slot = Some(tx);
                Ok(rx)
            }
            Inner::Pipelined { .. } => unreachable!("demultiplexer mode mismatch"),
        }
    }

    /// Registers a pipelined slot keyed by Transaction ID.
    pub async fn register(
        &self,
        transaction_id: u16,
    ) -> Result<oneshot::Receiver<Result<Vec<u8>, FrameError>>, BackpressureError> {
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Inner::Pipelined {
                max_in_flight,
                pending,
            } => {
                if pending.contains_key(&transaction_id) {
                    return Err(BackpressureError::TransactionIdInUse(transaction_id));
                }
                if pending.len() >= *max_in_flight {
                    return Err(BackpressureError::TooManyPending);
                }
                let (tx, rx) = oneshot::channel();
                pending.insert(transaction_id, tx);
                Ok(rx)
            }
            Inner::Serial(_) => unreachable!("demultiplexer mode mismatch"),
        }
    }

    /// Delivers a decoded frame. In pipelined mode the frame's first two
    /// bytes are its Transaction ID. A frame with no matching slot is
    /// discarded - unsolicited frames are never buffered, to prevent memory
    /// exhaustion (spec §4.6, §9 open question).
    pub async fn complete(&self, frame: Vec<u8>) {
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Inner::Serial(slot) => {
                if let Some(tx) = slot.take() {
                    let _ = tx.send(Ok(frame));
                }
            }
            Inner::Pipelined { pending, .. } => {
                let Some(transaction_id) = binary::u16_be(&frame, 0) else {
                    return;
                };
                if let Some(tx) = pending.remove(&transaction_id) {
                    let _ = tx.send(Ok(frame));
                }
            }
        }
    }

    /// Removes and fails a slot on cancellation (timeout, task cancel,
    /// post-registration write failure). Dropping the sender fails the
    /// receiver with a recv error, which callers map to a channel-closed
    /// transport error.
    pub async fn cancel_serial(&self) {
        let mut guard = self.inner.lock().await;
        if let Inner::Serial(slot) = &mut *guard {
            slot.take();
        }
    }

    pub async fn cancel(&self, transaction_id: u16) {
        let mut guard = self.inner.lock().await;
        if let Inner::Pipelined { pending, .. } = &mut *guard {
            pending.remove(&transaction_id);
        }
    }

    /// Drops every outstanding slot without a reason, e.g. when the
    /// connection closes cleanly with nothing left pending. Receivers see a
    /// recv error, which callers map to a generic channel-closed transport
    /// error. Use [`Self::fail_all`] instead when a specific cause is known.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Inner::Serial(slot) => {
                slot.take();
            }
            Inner::Pipelined { pending, .. } => {
                pending.clear();
            }
        }
    }

    /// Fails every outstanding slot with a specific frame error, e.g. an
    /// incomplete-frame-at-EOF from the stream decoder's `finish` (spec
    /// §4.5). Unlike [`Self::close`], callers awaiting the slot see the real
    /// cause instead of a generic channel-closed error.
    pub async fn fail_all(&self, err: FrameError) {
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Inner::Serial(slot) => {
                if let Some(tx) = slot.take() {
                    let _ = tx.send(Err(err));
                }
            }
            Inner::Pipelined { pending, .. } => {
                for (_, tx) in pending.drain() {
                    let _ = tx.send(Err(err.clone()));
                }
            }
        }
    }

    pub async fn pending_count(&self) -> usize {
        let guard = self.inner.lock().await;
        match &*guard {
            Inner::Serial(slot) => slot.is_some() as usize,
            Inner::Pipelined { pending, .. } => pending.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serial_mode_completes_the_single_slot() {
        let demux = Demultiplexer::serial();
        let rx = demux.register_serial().await.unwrap();
        demux.complete(vec![0xAA, 0xBB]).await;
        assert_eq!(rx.await.unwrap().unwrap(), vec![0xAA, 0xBB]);
    }

    #[tokio::test]
    async fn serial_mode_rejects_second_registration_while_pending() {
        let demux = Demultiplexer::serial();
        let _rx = demux.register_serial().await.unwrap();
        assert!(matches!(
            demux.register_serial().await.unwrap_err(),
            BackpressureError::TooManyPending
        ));
    }

    #[tokio::test]
    async fn pipelined_matches_out_of_order_completions() {
        // spec §8 scenario 7
        let demux = Demultiplexer::pipelined(4);
        let mut receivers = HashMap::new();
        for id in [1u16, 2, 3, 4] {
            receivers.insert(id, demux.register(id).await.unwrap());
        }
        for id in [3u16, 1, 4, 2] {
            let mut frame = id.to_be_bytes().to_vec();
            frame.push(0xFF);
            demux.complete(frame).await;
        }
        for (id, rx) in receivers {
            let frame = rx.await.unwrap().unwrap();
            assert_eq!(&frame[..2], &id.to_be_bytes());
        }
        assert_eq!(demux.pending_count().await, 0);
    }

    #[tokio::test]
    async fn pipelined_rejects_over_cap_registration() {
        let demux = Demultiplexer::pipelined(4);
        for id in [1u16, 2, 3, 4] {
            demux.register(id).await.unwrap();
        }
        assert!(matches!(
            demux.register(5).await.unwrap_err(),
            BackpressureError::TooManyPending
        ));
    }

    #[tokio::test]
    async fn pipelined_rejects_transaction_id_collision() {
        let demux = Demultiplexer::pipelined(4);
        demux.register(1).await.unwrap();
        assert!(matches!(
            demux.register(1).await.unwrap_err(),
            BackpressureError::TransactionIdInUse(1)
        ));
    }

    #[tokio::test]
    async fn unsolicited_frame_is_discarded_not_buffered() {
        let demux = Demultiplexer::pipelined(4);
        let rx = demux.register(1).await.unwrap();
        let mut stray = 99u16.to_be_bytes().to_vec();
        stray.push(0xFF);
        demux.complete(stray).await;
        demux.close().await;
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn close_fails_every_pending_slot() {
        let demux = Demultiplexer::pipelined(4);
        let rx1 = demux.register(1).await.unwrap();
        let rx2 = demux.register(2).await.unwrap();
        demux.close().await;
        assert!(rx1.await.is_err());
        assert!(rx2.await.is_err());
    }

    #[tokio::test]
    async fn fail_all_delivers_the_frame_error_to_every_pending_slot() {
        use crate::errors::ProtocolMismatchKind;

        let demux = Demultiplexer::pipelined(4);
        let rx1 = demux.register(1).await.unwrap();
        let rx2 = demux.register(2).await.unwrap();
        let err = FrameError::protocol_mismatch(ProtocolMismatchKind::FrameTooSmallAtEof, "3 bytes remained unconsumed at EOF");

        demux.fail_all(err).await;

        assert!(matches!(
            rx1.await.unwrap().unwrap_err(),
            FrameError::ProtocolMismatch {
                kind: ProtocolMismatchKind::FrameTooSmallAtEof,
                ..
            }
        ));
        assert!(matches!(
            rx2.await.unwrap().unwrap_err(),
            FrameError::ProtocolMismatch {
                kind: ProtocolMismatchKind::FrameTooSmallAtEof,
                ..
            }
        ));
        assert_eq!(demux.pending_count().await, 0);
    }
}
