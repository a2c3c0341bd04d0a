use rkyv::rancor;
use rkyv::util::AlignedVec;

use crate::world::{ArchivedInput, Input};

pub const DEFAULT_PORT: u16 = 7777;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_SYNC_INTERVAL: f32 = 0.1;

/// Every frame starts with a little-endian u16 payload length.
pub const LENGTH_PREFIX_SIZE: usize = 2;
pub const MAX_FRAME_PAYLOAD: usize = u16::MAX as usize;

pub const INPUT_PAYLOAD_SIZE: usize = size_of::<ArchivedInput>();

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("input payload is {got} bytes, expected {expected}")]
    InputLength { got: usize, expected: usize },
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

pub fn encode_input(input: &Input) -> Result<AlignedVec, ProtocolError> {
    rkyv::to_bytes::<rancor::Error>(input).map_err(ProtocolError::Serialize)
}

/// Validates an uploaded input record and clamps its axes.
pub fn decode_input(payload: &[u8]) -> Result<Input, ProtocolError> {
    if payload.len() != INPUT_PAYLOAD_SIZE {
        return Err(ProtocolError::InputLength {
            got: payload.len(),
            expected: INPUT_PAYLOAD_SIZE,
        });
    }

    let mut aligned = AlignedVec::<16>::new();
    aligned.extend_from_slice(payload);

    rkyv::from_bytes::<Input, rancor::Error>(&aligned)
        .map(Input::normalized)
        .map_err(ProtocolError::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_payload_is_compact() {
        let input = Input {
            accel: -1,
            turn: 1,
            fire: true,
        };

        let bytes = encode_input(&input).unwrap();
        assert_eq!(bytes.len(), INPUT_PAYLOAD_SIZE);
        assert_eq!(decode_input(&bytes).unwrap(), input);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(matches!(
            decode_input(&[0, 0]),
            Err(ProtocolError::InputLength { got: 2, .. })
        ));
        assert!(decode_input(&[]).is_err());
    }

    #[test]
    fn decode_rejects_invalid_bool() {
        assert!(matches!(
            decode_input(&[0, 0, 7]),
            Err(ProtocolError::Deserialize(_))
        ));
    }

    #[test]
    fn decode_clamps_axes() {
        let decoded = decode_input(&[5, 0x80, 0]).unwrap();
        assert_eq!(decoded.accel, 1);
        assert_eq!(decoded.turn, -1);
        assert!(!decoded.fire);
    }
}
