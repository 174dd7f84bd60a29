//! Incremental MBAP frame extraction from a chunked byte stream (spec §4.5).
//!
//! States mirror the spec directly: `needHeader` (fewer than 7 bytes
//! buffered), `needBody` (header parsed, waiting for the rest of the
//! frame), `emit` (a complete frame is ready). Errors are terminal -
//! Modbus has no resync story, so a malformed header closes the
//! connection rather than attempting to recover.

use crate::binary;
use crate::errors::{FrameError, ProtocolMismatchKind};

/// 6-byte MBAP prefix (excluding Unit ID) + 254-byte max `Length` payload.
pub const MAX_ADU_LEN: usize = 260;

pub struct StreamFrameDecoder {
    buffer: Vec<u8>,
}

impl StreamFrameDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Appends newly-arrived bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pulls the next complete frame out of the buffer, if any. Returns
    /// `Ok(None)` when more bytes are needed. A returned frame includes the
    /// 7-byte MBAP header.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.buffer.len() < 7 {
            return Ok(None); // needHeader
        }
        let protocol_id = binary::u16_be(&self.buffer, 2).unwrap();
        if protocol_id != 0 {
            return Err(FrameError::protocol_mismatch(
                ProtocolMismatchKind::InvalidProtocolId,
                format!("expected 0, got {protocol_id}"),
            ));
        }
        let length = binary::u16_be(&self.buffer, 4).unwrap();
        if length == 0 || length > 254 {
            return Err(FrameError::protocol_mismatch(
                ProtocolMismatchKind::FrameTooLarge,
                format!("length field {length} out of range 1..=254"),
            ));
        }
        let frame_size = 6 + length as usize;
        if frame_size > MAX_ADU_LEN {
            return Err(FrameError::protocol_mismatch(
                ProtocolMismatchKind::FrameTooLarge,
                format!("frame size {frame_size} exceeds maximum ADU of {MAX_ADU_LEN}"),
            ));
        }
        if self.buffer.len() < frame_size {
            return Ok(None); // needBody
        }
        let frame = self.buffer[..frame_size].to_vec();
        self.buffer.drain(..frame_size); // emit
        Ok(Some(frame))
    }

    /// Call when the underlying stream has closed. Any leftover bytes mean
    /// the peer hung up mid-frame.
    pub fn finish(&self) -> Result<(), FrameError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(FrameError::protocol_mismatch(
                ProtocolMismatchKind::FrameTooSmallAtEof,
                format!("{} bytes remained unconsumed at EOF", self.buffer.len()),
            ))
        }
    }
}

impl Default for StreamFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adu::mbap;

    #[test]
    fn emits_one_frame_per_delivery_when_complete() {
        let mut decoder = StreamFrameDecoder::new();
        let adu = mbap::build(1, 1, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        decoder.feed(&adu);
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame, adu);
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn reassembles_a_frame_delivered_in_chunks() {
        let mut decoder = StreamFrameDecoder::new();
        let adu = mbap::build(7, 1, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        decoder.feed(&adu[..4]);
        assert!(decoder.next_frame().unwrap().is_none());
        decoder.feed(&adu[4..]);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), adu);
    }

    #[test]
    fn emits_multiple_frames_pipelined_back_to_back() {
        let mut decoder = StreamFrameDecoder::new();
        let a = mbap::build(1, 1, &[0x03, 0x00, 0x00, 0x00, 0x0A]);
        let b = mbap::build(2, 1, &[0x04, 0x00, 0x00, 0x00, 0x05]);
        let mut both = a.clone();
        both.extend_from_slice(&b);
        decoder.feed(&both);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), a);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), b);
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn rejects_invalid_protocol_id() {
        let mut adu = mbap::build(1, 1, &[0x03]);
        adu[3] = 0x01;
        let mut decoder = StreamFrameDecoder::new();
        decoder.feed(&adu);
        assert!(matches!(
            decoder.next_frame().unwrap_err(),
            FrameError::ProtocolMismatch { .. }
        ));
    }

    #[test]
    fn finish_with_leftover_bytes_is_an_error() {
        let mut decoder = StreamFrameDecoder::new();
        decoder.feed(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03]);
        assert!(decoder.next_frame().unwrap().is_none());
        assert!(decoder.finish().is_err());
    }

    #[test]
    fn finish_with_empty_buffer_is_ok() {
        let decoder = StreamFrameDecoder::new();
        assert!(decoder.finish().is_ok());
    }
}
