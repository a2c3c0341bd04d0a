use glam::Vec2;

/// Opaque ship label. Never reused while the server process runs; 0 means "no ship".
pub type ShipId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ship {
    pub id: ShipId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub rotation_velocity: f32,
    /// Set only on the recipient's own ship in a decoded snapshot.
    pub local: bool,
}

impl Ship {
    pub fn new(id: ShipId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Asteroid {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Visual spin only.
    pub rotation: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Laser {
    pub position: Vec2,
    /// Frozen at spawn time.
    pub rotation: f32,
    /// Seconds left before the laser expires.
    pub life: f32,
}

impl Laser {
    pub fn new(position: Vec2, rotation: f32, life: f32) -> Self {
        Self {
            position,
            rotation,
            life,
        }
    }
}
