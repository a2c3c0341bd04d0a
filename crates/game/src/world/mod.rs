mod entity;
mod input;
mod math;
mod state;

pub use entity::{Asteroid, Laser, Ship, ShipId};
pub use input::{ArchivedInput, Input, Key};
pub use math::{heading, is_outside, wrap_toroidal};
pub use state::{GameState, MAX_ASTEROIDS, MAX_LASERS, MAX_SHIPS};
