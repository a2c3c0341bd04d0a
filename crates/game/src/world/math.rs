use glam::Vec2;

/// Unit thrust direction for a rotation in radians. Rotation 0 points up (+Y).
#[inline]
pub fn heading(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(sin, cos)
}

/// Re-enters the opposite edge when a position leaves `[-extents, extents]`.
pub fn wrap_toroidal(position: &mut Vec2, extents: Vec2) {
    if position.x > extents.x {
        position.x -= 2.0 * extents.x;
    } else if position.x < -extents.x {
        position.x += 2.0 * extents.x;
    }

    if position.y > extents.y {
        position.y -= 2.0 * extents.y;
    } else if position.y < -extents.y {
        position.y += 2.0 * extents.y;
    }
}

#[inline]
pub fn is_outside(position: Vec2, extents: Vec2) -> bool {
    position.x.abs() > extents.x || position.y.abs() > extents.y
}
