//! Register payload decoding
//!
//! Registers travel big-endian, two bytes each.

use bytes::Buf;

use crate::{TransportError, TransportResult};

/// Bytes per register
pub const REGISTER_SIZE: usize = 2;

/// Decode a big-endian register payload
pub fn decode_register_payload(payload: &[u8]) -> TransportResult<Vec<u16>> {
    if payload.len() % REGISTER_SIZE != 0 {
        return Err(TransportError::InvalidDataLength(payload.len()));
    }

    let mut buf = payload;
    let mut registers = Vec::with_capacity(payload.len() / REGISTER_SIZE);
    while buf.remaining() >= REGISTER_SIZE {
        registers.push(buf.get_u16());
    }
    Ok(registers)
}

/// Decode exactly `count` registers, rejecting short or long payloads
pub fn decode_exact(payload: &[u8], count: u16) -> TransportResult<Vec<u16>> {
    let expected = count as usize * REGISTER_SIZE;
    if payload.len() != expected {
        return Err(TransportError::InvalidDataLength(payload.len()));
    }
    decode_register_payload(payload)
}

/// Encode registers big-endian, as a device would reply
pub fn encode_register_payload(registers: &[u16]) -> Vec<u8> {
    registers.iter().flat_map(|r| r.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_big_endian() {
        // 0x0108 = 264 = 26.4°C
        assert_eq!(decode_register_payload(&[0x01, 0x08]).unwrap(), vec![0x0108]);
        // 0xFE70 = -400 as i16
        let regs = decode_register_payload(&[0xFE, 0x70]).unwrap();
        assert_eq!(regs[0] as i16, -400);
    }

    #[test]
    fn test_decode_odd_length() {
        assert_eq!(
            decode_register_payload(&[0x01]),
            Err(TransportError::InvalidDataLength(1))
        );
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_register_payload(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_exact() {
        assert_eq!(decode_exact(&[0x00, 0xFA], 1).unwrap(), vec![250]);
        assert_eq!(
            decode_exact(&[0x00, 0xFA, 0x00, 0x01], 1),
            Err(TransportError::InvalidDataLength(4))
        );
    }

    #[test]
    fn test_encode_matches_decode() {
        let regs = [0x0108, 0xFE70, 0xFFFF];
        let bytes = encode_register_payload(&regs);
        assert_eq!(bytes, vec![0x01, 0x08, 0xFE, 0x70, 0xFF, 0xFF]);
        assert_eq!(decode_register_payload(&bytes).unwrap(), regs.to_vec());
    }

    proptest! {
        #[test]
        fn prop_only_even_payloads_decode(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let result = decode_register_payload(&payload);
            if payload.len() % 2 == 0 {
                prop_assert_eq!(result.unwrap().len(), payload.len() / 2);
            } else {
                prop_assert_eq!(result, Err(TransportError::InvalidDataLength(payload.len())));
            }
        }
    }
}
