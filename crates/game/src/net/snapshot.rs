//! Canonical fixed-size encoding of a `GameState`.
//!
//! Every slot is written in slot order as a fixed-size little-endian record, so two
//! snapshots of the same state are byte-identical and an unchanged slot XORs to zeros.
//! Empty slots are all-zero records.

use bitflags::bitflags;
use glam::Vec2;

use crate::world::{
    Asteroid, GameState, Laser, MAX_ASTEROIDS, MAX_LASERS, MAX_SHIPS, Ship,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotFlags: u8 {
        const ALIVE = 1 << 0;
        /// Ship belongs to the snapshot's recipient.
        const LOCAL = 1 << 1;
    }
}

// flags, id, position, velocity, rotation, rotation_velocity
pub const SHIP_RECORD_SIZE: usize = 1 + 4 + 8 + 8 + 4 + 4;
// flags, position, velocity, rotation, size
pub const ASTEROID_RECORD_SIZE: usize = 1 + 8 + 8 + 4 + 4;
// flags, position, rotation, life
pub const LASER_RECORD_SIZE: usize = 1 + 8 + 4 + 4;

pub const SNAPSHOT_SIZE: usize = MAX_SHIPS * SHIP_RECORD_SIZE
    + MAX_ASTEROIDS * ASTEROID_RECORD_SIZE
    + MAX_LASERS * LASER_RECORD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Ship,
    Asteroid,
    Laser,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot is {got} bytes, expected {expected}")]
    Length { expected: usize, got: usize },
    #[error("{kind:?} slot {slot} has invalid flags {flags:#04x}")]
    InvalidFlags { kind: SlotKind, slot: usize, flags: u8 },
    #[error("{kind:?} slot {slot} is empty but not zeroed")]
    DirtySlot { kind: SlotKind, slot: usize },
    #[error("ship slot {slot} is alive with id 0")]
    ZeroShipId { slot: usize },
    #[error("more than one ship is marked local")]
    MultipleLocal,
}

/// Serializes `state`, flagging the ship in `local_slot` as the recipient's own.
pub fn encode_snapshot(state: &GameState, local_slot: Option<usize>) -> Vec<u8> {
    let mut writer = Writer::with_capacity(SNAPSHOT_SIZE);

    for (slot, ship) in state.ships.iter().enumerate() {
        match ship {
            Some(ship) => {
                let mut flags = SlotFlags::ALIVE;
                flags.set(SlotFlags::LOCAL, local_slot == Some(slot));
                writer.u8(flags.bits());
                writer.u32(ship.id);
                writer.vec2(ship.position);
                writer.vec2(ship.velocity);
                writer.f32(ship.rotation);
                writer.f32(ship.rotation_velocity);
            }
            None => writer.zeros(SHIP_RECORD_SIZE),
        }
    }

    for asteroid in &state.asteroids {
        match asteroid {
            Some(asteroid) => {
                writer.u8(SlotFlags::ALIVE.bits());
                writer.vec2(asteroid.position);
                writer.vec2(asteroid.velocity);
                writer.f32(asteroid.rotation);
                writer.f32(asteroid.size);
            }
            None => writer.zeros(ASTEROID_RECORD_SIZE),
        }
    }

    for laser in &state.lasers {
        match laser {
            Some(laser) => {
                writer.u8(SlotFlags::ALIVE.bits());
                writer.vec2(laser.position);
                writer.f32(laser.rotation);
                writer.f32(laser.life);
            }
            None => writer.zeros(LASER_RECORD_SIZE),
        }
    }

    debug_assert_eq!(writer.buf.len(), SNAPSHOT_SIZE);
    writer.buf
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<GameState, SnapshotError> {
    if bytes.len() != SNAPSHOT_SIZE {
        return Err(SnapshotError::Length {
            expected: SNAPSHOT_SIZE,
            got: bytes.len(),
        });
    }

    let mut reader = Reader { bytes, pos: 0 };
    let mut state = GameState::new();
    let mut local_seen = false;

    for slot in 0..MAX_SHIPS {
        let Some(flags) = reader.record_flags(SlotKind::Ship, slot, SHIP_RECORD_SIZE)? else {
            continue;
        };

        let ship = Ship {
            id: reader.u32(),
            position: reader.vec2(),
            velocity: reader.vec2(),
            rotation: reader.f32(),
            rotation_velocity: reader.f32(),
            local: flags.contains(SlotFlags::LOCAL),
        };
        if ship.id == 0 {
            return Err(SnapshotError::ZeroShipId { slot });
        }
        if ship.local {
            if local_seen {
                return Err(SnapshotError::MultipleLocal);
            }
            local_seen = true;
        }
        state.ships[slot] = Some(ship);
    }

    for slot in 0..MAX_ASTEROIDS {
        if reader
            .record_flags(SlotKind::Asteroid, slot, ASTEROID_RECORD_SIZE)?
            .is_none()
        {
            continue;
        }

        state.asteroids[slot] = Some(Asteroid {
            position: reader.vec2(),
            velocity: reader.vec2(),
            rotation: reader.f32(),
            size: reader.f32(),
        });
    }

    for slot in 0..MAX_LASERS {
        if reader
            .record_flags(SlotKind::Laser, slot, LASER_RECORD_SIZE)?
            .is_none()
        {
            continue;
        }

        state.lasers[slot] = Some(Laser {
            position: reader.vec2(),
            rotation: reader.f32(),
            life: reader.f32(),
        });
    }

    Ok(state)
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn vec2(&mut self, value: Vec2) {
        self.f32(value.x);
        self.f32(value.y);
    }

    fn zeros(&mut self, len: usize) {
        self.buf.resize(self.buf.len() + len, 0);
    }
}

/// Cursor over a buffer whose total length has already been validated.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        let [value] = self.array::<1>();
        value
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.array())
    }

    fn vec2(&mut self) -> Vec2 {
        let x = self.f32();
        let y = self.f32();
        Vec2::new(x, y)
    }

    /// Reads a record's flag byte. Returns `None` (and skips the record) for a valid empty slot.
    fn record_flags(
        &mut self,
        kind: SlotKind,
        slot: usize,
        record_size: usize,
    ) -> Result<Option<SlotFlags>, SnapshotError> {
        let raw = self.u8();

        if raw == 0 {
            let body = &self.bytes[self.pos..self.pos + record_size - 1];
            self.pos += record_size - 1;
            return if body.iter().all(|b| *b == 0) {
                Ok(None)
            } else {
                Err(SnapshotError::DirtySlot { kind, slot })
            };
        }

        let allowed = match kind {
            SlotKind::Ship => SlotFlags::ALIVE | SlotFlags::LOCAL,
            SlotKind::Asteroid | SlotKind::Laser => SlotFlags::ALIVE,
        };
        match SlotFlags::from_bits(raw) {
            Some(flags) if allowed.contains(flags) && flags.contains(SlotFlags::ALIVE) => {
                Ok(Some(flags))
            }
            _ => Err(SnapshotError::InvalidFlags {
                kind,
                slot,
                flags: raw,
            }),
        }
    }
}
