//! Longitudinal Redundancy Check used by the Modbus ASCII ADU.

/// Two's complement of the sum of `data`, modulo 256.
pub fn compute(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (!sum).wrapping_add(1)
}

/// True if `frame`'s trailing byte is the LRC of everything before it.
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&received, body)) => compute(body) == received,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_its_own_check_value() {
        let body = [0x01, 0x03, 0x00, 0x6B, 0x00, 0x03];
        let lrc = compute(&body);
        let mut frame = body.to_vec();
        frame.push(lrc);
        assert!(verify(&frame));
    }

    #[test]
    fn sum_of_frame_including_lrc_is_zero() {
        let body = [0x01, 0x03, 0x00, 0x6B, 0x00, 0x03];
        let lrc = compute(&body);
        let total = body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)).wrapping_add(lrc);
        assert_eq!(total, 0);
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(!verify(&[]));
    }
}
