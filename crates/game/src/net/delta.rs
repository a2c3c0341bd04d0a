//! Per-connection XOR delta compression of snapshots.
//!
//! Each side keeps the last absolute snapshot it knows the peer holds. The diff against it is
//! mostly zeros when little changed, which zstd squeezes down to a few bytes. Both `prev`
//! buffers start zeroed, so the first diff is the full state.

use std::io;

use zstd::bulk::{Compressor, Decompressor};

use super::snapshot::{SNAPSHOT_SIZE, SnapshotError, decode_snapshot};
use crate::world::GameState;

pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    #[error("compression failed: {0}")]
    Compress(io::Error),
    #[error("decompression failed: {0}")]
    Decompress(io::Error),
    #[error("decompressed snapshot is {got} bytes, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("snapshot is {got} bytes, expected {expected}")]
    InputSize { expected: usize, got: usize },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Writes `a[i] ^ b[i]` into `out[i]`. All three slices must have equal length.
pub fn xor_into(out: &mut [u8], a: &[u8], b: &[u8]) {
    debug_assert!(out.len() == a.len() && a.len() == b.len());
    for ((dst, x), y) in out.iter_mut().zip(a).zip(b) {
        *dst = x ^ y;
    }
}

pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().min(b.len());
    let mut out = vec![0u8; len];
    xor_into(&mut out, &a[..len], &b[..len]);
    out
}

/// Server half: diffs outgoing snapshots against what the client last received.
pub struct DeltaEncoder {
    prev: Box<[u8]>,
    diff: Box<[u8]>,
    compressor: Compressor<'static>,
}

impl DeltaEncoder {
    pub fn new(level: i32) -> Result<Self, DeltaError> {
        Ok(Self {
            prev: vec![0u8; SNAPSHOT_SIZE].into_boxed_slice(),
            diff: vec![0u8; SNAPSHOT_SIZE].into_boxed_slice(),
            compressor: Compressor::new(level).map_err(DeltaError::Compress)?,
        })
    }

    /// Returns the compressed diff of `current` against the last committed snapshot.
    pub fn encode(&mut self, current: &[u8]) -> Result<Vec<u8>, DeltaError> {
        check_size(current)?;
        xor_into(&mut self.diff, current, &self.prev);
        self.compressor
            .compress(&self.diff)
            .map_err(DeltaError::Compress)
    }

    /// Records `current` as the peer's state once its diff has been handed to the transport.
    pub fn commit(&mut self, current: &[u8]) -> Result<(), DeltaError> {
        check_size(current)?;
        self.prev.copy_from_slice(current);
        Ok(())
    }

    pub fn prev(&self) -> &[u8] {
        &self.prev
    }
}

/// Client half: rebuilds absolute snapshots from the server's diffs.
pub struct DeltaDecoder {
    prev: Box<[u8]>,
    decompressor: Decompressor<'static>,
}

impl DeltaDecoder {
    pub fn new() -> Result<Self, DeltaError> {
        Ok(Self {
            prev: vec![0u8; SNAPSHOT_SIZE].into_boxed_slice(),
            decompressor: Decompressor::new().map_err(DeltaError::Decompress)?,
        })
    }

    /// Decompresses and applies one diff, returning the reconstructed absolute snapshot bytes.
    pub fn apply(&mut self, payload: &[u8]) -> Result<&[u8], DeltaError> {
        let diff = self
            .decompressor
            .decompress(payload, SNAPSHOT_SIZE)
            .map_err(DeltaError::Decompress)?;
        if diff.len() != SNAPSHOT_SIZE {
            return Err(DeltaError::SizeMismatch {
                expected: SNAPSHOT_SIZE,
                got: diff.len(),
            });
        }

        for (prev, d) in self.prev.iter_mut().zip(&diff) {
            *prev ^= d;
        }
        Ok(&self.prev)
    }

    /// Applies one diff and decodes the result. A snapshot that fails to decode leaves
    /// `prev` advanced; the connection is expected to be dropped in that case.
    pub fn decode(&mut self, payload: &[u8]) -> Result<GameState, DeltaError> {
        let current = self.apply(payload)?;
        Ok(decode_snapshot(current)?)
    }

    pub fn prev(&self) -> &[u8] {
        &self.prev
    }
}

fn check_size(bytes: &[u8]) -> Result<(), DeltaError> {
    if bytes.len() != SNAPSHOT_SIZE {
        return Err(DeltaError::InputSize {
            expected: SNAPSHOT_SIZE,
            got: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::net::snapshot::encode_snapshot;

    fn codec_pair() -> (DeltaEncoder, DeltaDecoder) {
        (
            DeltaEncoder::new(DEFAULT_COMPRESSION_LEVEL).unwrap(),
            DeltaDecoder::new().unwrap(),
        )
    }

    #[test]
    fn xor_truncates_to_shorter_input() {
        assert_eq!(xor(&[0xff, 0x0f, 0xaa], &[0x0f, 0x0f]), vec![0xf0, 0x00]);
        assert!(xor(&[], &[1, 2, 3]).is_empty());
    }

    #[test]
    fn first_diff_is_full_state() {
        let mut state = GameState::new();
        state.add_ship();
        let current = encode_snapshot(&state, Some(0));

        let (mut encoder, mut decoder) = codec_pair();
        let payload = encoder.encode(&current).unwrap();
        encoder.commit(&current).unwrap();

        assert_eq!(decoder.apply(&payload).unwrap(), &current[..]);
        assert_eq!(encoder.prev(), decoder.prev());
    }

    #[test]
    fn chained_diffs_track_state() {
        let (mut encoder, mut decoder) = codec_pair();
        let mut state = GameState::new();
        state.add_ship();
        state.add_laser(Vec2::ZERO, 0.0, 1.0);

        for step in 0..5 {
            if let Some(ship) = state.ships[0].as_mut() {
                ship.position.x += step as f32;
            }
            if step == 3 {
                state.lasers[0] = None;
            }

            let current = encode_snapshot(&state, Some(0));
            let payload = encoder.encode(&current).unwrap();
            encoder.commit(&current).unwrap();

            let decoded = decoder.decode(&payload).unwrap();
            assert_eq!(decoded.ships[0].unwrap().position, state.ships[0].unwrap().position);
            assert_eq!(decoded.lasers[0].is_some(), step < 3);
        }
    }

    #[test]
    fn unchanged_state_compresses_small() {
        let (mut encoder, _) = codec_pair();
        let mut state = GameState::new();
        for _ in 0..8 {
            state.add_ship();
        }
        let current = encode_snapshot(&state, None);
        encoder.encode(&current).unwrap();
        encoder.commit(&current).unwrap();

        let repeat = encoder.encode(&current).unwrap();
        assert!(repeat.len() < 64, "diff of identical state was {} bytes", repeat.len());
    }

    #[test]
    fn uncommitted_diff_is_resent_against_old_baseline() {
        let (mut encoder, mut decoder) = codec_pair();
        let mut state = GameState::new();
        state.add_ship();
        let first = encode_snapshot(&state, Some(0));
        encoder.encode(&first).unwrap();

        state.add_ship();
        let second = encode_snapshot(&state, Some(0));
        let payload = encoder.encode(&second).unwrap();
        encoder.commit(&second).unwrap();

        assert_eq!(decoder.apply(&payload).unwrap(), &second[..]);
    }

    #[test]
    fn wrong_size_payload_is_rejected() {
        let (_, mut decoder) = codec_pair();
        let short = zstd::bulk::compress(&[1u8; 100], DEFAULT_COMPRESSION_LEVEL).unwrap();

        assert!(matches!(
            decoder.apply(&short),
            Err(DeltaError::SizeMismatch { got: 100, .. })
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let (_, mut decoder) = codec_pair();
        let long =
            zstd::bulk::compress(&vec![0u8; SNAPSHOT_SIZE + 1], DEFAULT_COMPRESSION_LEVEL).unwrap();

        assert!(decoder.apply(&long).is_err());
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let (_, mut decoder) = codec_pair();
        assert!(matches!(
            decoder.apply(&[0xde, 0xad, 0xbe, 0xef]),
            Err(DeltaError::Decompress(_))
        ));
    }

    #[test]
    fn encoder_rejects_wrong_input_size() {
        let (mut encoder, _) = codec_pair();
        assert!(matches!(
            encoder.encode(&[0u8; 12]),
            Err(DeltaError::InputSize { got: 12, .. })
        ));
    }

    proptest! {
        #[test]
        fn xor_diff_roundtrip(pair in prop::collection::vec(any::<(u8, u8)>(), 0..512)) {
            let (prev, current): (Vec<u8>, Vec<u8>) = pair.into_iter().unzip();
            let diff = xor(&prev, &current);
            prop_assert_eq!(xor(&prev, &diff), current);
        }

        #[test]
        fn codec_roundtrip_over_random_snapshots(
            prev in prop::collection::vec(any::<u8>(), SNAPSHOT_SIZE),
            current in prop::collection::vec(any::<u8>(), SNAPSHOT_SIZE),
        ) {
            let (mut encoder, mut decoder) = codec_pair();

            let payload = encoder.encode(&prev).unwrap();
            encoder.commit(&prev).unwrap();
            prop_assert_eq!(decoder.apply(&payload).unwrap(), &prev[..]);

            let payload = encoder.encode(&current).unwrap();
            encoder.commit(&current).unwrap();
            prop_assert_eq!(decoder.apply(&payload).unwrap(), &current[..]);
        }
    }
}
