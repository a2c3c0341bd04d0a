use glam::Vec2;

use super::config::SimConfig;
use crate::world::{Asteroid, GameState, Input, Laser, Ship, heading, is_outside, wrap_toroidal};

pub fn step_ship(ship: &mut Ship, input: Input, config: &SimConfig, dt: f32) {
    let thrust = heading(ship.rotation) * f32::from(input.accel) * config.ship_acceleration;
    ship.velocity += thrust * dt;
    ship.velocity *= config.ship_damping;
    if ship.velocity.length() < config.rest_threshold {
        ship.velocity = Vec2::ZERO;
    }

    ship.rotation_velocity += f32::from(input.turn) * config.ship_rotate_speed * dt;
    ship.rotation_velocity *= config.ship_rotation_damping;
    if ship.rotation_velocity.abs() < config.rest_threshold {
        ship.rotation_velocity = 0.0;
    }

    ship.position += ship.velocity * dt;
    ship.rotation += ship.rotation_velocity * dt;

    wrap_toroidal(&mut ship.position, config.extents);
}

pub fn step_asteroid(asteroid: &mut Asteroid, config: &SimConfig, dt: f32) {
    asteroid.position += asteroid.velocity * dt;
    asteroid.rotation += dt;

    wrap_toroidal(&mut asteroid.position, config.extents);
}

/// Remaining life below this counts as expired; absorbs f32 drift from summing `dt`.
const LIFE_EPSILON: f32 = 1e-4;

/// Returns false once the laser has expired or left the world. Lasers never wrap.
pub fn step_laser(laser: &mut Laser, config: &SimConfig, dt: f32) -> bool {
    laser.life -= dt;
    if laser.life <= LIFE_EPSILON {
        return false;
    }

    laser.position += heading(laser.rotation) * config.laser_speed * dt;
    !is_outside(laser.position, config.extents)
}

/// Advances every live entity by one tick. `input_for` supplies the input of the ship in a slot.
pub fn simulate<F>(state: &mut GameState, config: &SimConfig, dt: f32, mut input_for: F)
where
    F: FnMut(usize, &Ship) -> Input,
{
    for (slot, entry) in state.ships.iter_mut().enumerate() {
        if let Some(ship) = entry.as_mut() {
            let input = input_for(slot, ship);
            step_ship(ship, input, config, dt);
        }
    }

    for asteroid in state.asteroids.iter_mut().flatten() {
        step_asteroid(asteroid, config, dt);
    }

    for entry in state.lasers.iter_mut() {
        let alive = entry
            .as_mut()
            .is_some_and(|laser| step_laser(laser, config, dt));
        if !alive {
            *entry = None;
        }
    }
}

/// Per-player fire cadence. The timer only runs while fire is held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FireControl {
    timer: f32,
}

impl FireControl {
    /// Returns true when a laser should spawn this tick.
    pub fn update(&mut self, fire: bool, interval: f32, dt: f32) -> bool {
        if !fire {
            return false;
        }

        self.timer -= dt;
        if self.timer < 0.0 {
            self.timer += interval;
            true
        } else {
            false
        }
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }
}
