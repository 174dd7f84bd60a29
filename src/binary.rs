//! Bounds-checked big/little-endian readers (spec §4.1).
//!
//! These are the sole primitive PDU parsers use to access payload bytes;
//! decode paths never index raw slices directly. Every reader returns
//! `None` instead of panicking when the requested field would run past
//! the end of the buffer - this is the defense-in-depth the spec calls
//! for against the Modbus CVE class of missing bounds checks
//! (CVE-2024-10918, CVE-2023-26793, CVE-2022-0367).

pub fn u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

pub fn u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub fn u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Bytes at `offset..offset+len`, or `None` if that range runs past `buf`.
pub fn bytes(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_within_bounds() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(u8(&buf, 0), Some(0x01));
        assert_eq!(u16_be(&buf, 0), Some(0x0102));
        assert_eq!(u16_le(&buf, 0), Some(0x0201));
        assert_eq!(u32_be(&buf, 0), Some(0x01020304));
        assert_eq!(u32_le(&buf, 0), Some(0x04030201));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let buf = [0x01, 0x02];
        assert_eq!(u8(&buf, 2), None);
        assert_eq!(u16_be(&buf, 1), None);
        assert_eq!(u16_le(&buf, 2), None);
        assert_eq!(u32_be(&buf, 0), None);
        assert_eq!(bytes(&buf, 0, 3), None);
    }

    #[test]
    fn rejects_offset_overflow() {
        let buf = [0u8; 4];
        assert_eq!(u16_be(&buf, usize::MAX), None);
        assert_eq!(bytes(&buf, usize::MAX, 1), None);
    }
}
