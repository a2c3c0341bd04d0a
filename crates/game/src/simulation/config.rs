use glam::Vec2;

pub const GAME_WIDTH: f32 = 1024.0;
pub const GAME_HEIGHT: f32 = 768.0;
pub const GAME_SCALE: f32 = 32.0;

/// Simulation tunables shared by the server and the client's local step.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// World half extents in simulation units (pixel size / scale).
    pub extents: Vec2,

    pub ship_acceleration: f32,
    pub ship_rotate_speed: f32,
    /// Applied once per tick, not scaled by `dt`.
    pub ship_damping: f32,
    pub ship_rotation_damping: f32,
    pub rest_threshold: f32,

    pub ship_fire_interval: f32,
    pub laser_speed: f32,
    pub laser_lifetime: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            extents: Vec2::new(GAME_WIDTH / GAME_SCALE, GAME_HEIGHT / GAME_SCALE),

            ship_acceleration: 20.0,
            ship_rotate_speed: 10.0,
            ship_damping: 0.99,
            ship_rotation_damping: 0.98,
            rest_threshold: 0.001,

            ship_fire_interval: 0.25,
            laser_speed: 30.0,
            laser_lifetime: 1.0,
        }
    }
}
