use glam::Vec2;
use rand::Rng;

use super::entity::{Asteroid, Laser, Ship, ShipId};

pub const MAX_SHIPS: usize = 32;
pub const MAX_ASTEROIDS: usize = 64;
pub const MAX_LASERS: usize = 128;

const ASTEROID_SIZE_MIN: f32 = 0.5;
const ASTEROID_SIZE_RANGE: f32 = 3.0;
const ASTEROID_SPEED_MIN: f32 = 0.1;
const ASTEROID_SPEED_RANGE: f32 = 3.0;

/// The synchronised aggregate. Slot index is the identity used on the wire;
/// `None` marks an empty slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub ships: [Option<Ship>; MAX_SHIPS],
    pub asteroids: [Option<Asteroid>; MAX_ASTEROIDS],
    pub lasers: [Option<Laser>; MAX_LASERS],
    next_ship_id: ShipId,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            ships: [None; MAX_SHIPS],
            asteroids: [None; MAX_ASTEROIDS],
            lasers: [None; MAX_LASERS],
            next_ship_id: 1,
        }
    }

    /// Claims the first free ship slot. The id counter only advances on success.
    pub fn add_ship(&mut self) -> Option<(usize, ShipId)> {
        let slot = self.ships.iter().position(Option::is_none)?;
        let id = self.next_ship_id;
        self.next_ship_id += 1;
        self.ships[slot] = Some(Ship::new(id));
        Some((slot, id))
    }

    pub fn remove_ship(&mut self, id: ShipId) -> Option<usize> {
        if id == 0 {
            return None;
        }
        let slot = self
            .ships
            .iter()
            .position(|ship| ship.is_some_and(|s| s.id == id))?;
        self.ships[slot] = None;
        Some(slot)
    }

    /// Spawns an asteroid inside the central half of the world with random spin, size and drift.
    pub fn add_asteroid<R: Rng + ?Sized>(&mut self, rng: &mut R, extents: Vec2) -> Option<usize> {
        let slot = self.asteroids.iter().position(Option::is_none)?;

        let half = extents * 0.5;
        let asteroid = Asteroid {
            position: Vec2::new(
                rng.gen_range(-half.x..half.x),
                rng.gen_range(-half.y..half.y),
            ),
            velocity: Vec2::new(
                ASTEROID_SPEED_MIN + ASTEROID_SPEED_RANGE * rng.gen_range(0.0..1.0f32),
                ASTEROID_SPEED_MIN + ASTEROID_SPEED_RANGE * rng.gen_range(0.0..1.0f32),
            ),
            rotation: rng.gen_range(0.0..std::f32::consts::TAU),
            size: ASTEROID_SIZE_MIN + ASTEROID_SIZE_RANGE * rng.gen_range(0.0..1.0f32),
        };

        self.asteroids[slot] = Some(asteroid);
        Some(slot)
    }

    pub fn add_laser(&mut self, position: Vec2, rotation: f32, life: f32) -> Option<usize> {
        let slot = self.lasers.iter().position(Option::is_none)?;
        self.lasers[slot] = Some(Laser::new(position, rotation, life));
        Some(slot)
    }

    pub fn ships(&self) -> impl Iterator<Item = (usize, &Ship)> {
        self.ships
            .iter()
            .enumerate()
            .filter_map(|(slot, ship)| ship.as_ref().map(|s| (slot, s)))
    }

    pub fn asteroids(&self) -> impl Iterator<Item = &Asteroid> {
        self.asteroids.iter().flatten()
    }

    pub fn lasers(&self) -> impl Iterator<Item = &Laser> {
        self.lasers.iter().flatten()
    }

    pub fn local_ship(&self) -> Option<(usize, &Ship)> {
        self.ships().find(|(_, ship)| ship.local)
    }

    pub fn ship_count(&self) -> usize {
        self.ships.iter().flatten().count()
    }

    pub fn asteroid_count(&self) -> usize {
        self.asteroids.iter().flatten().count()
    }

    pub fn laser_count(&self) -> usize {
        self.lasers.iter().flatten().count()
    }

    /// Replaces every slot with the contents of a received snapshot. The id counter is untouched.
    pub fn overwrite_from(&mut self, other: &GameState) {
        self.ships = other.ships;
        self.asteroids = other.asteroids;
        self.lasers = other.lasers;
    }
}
