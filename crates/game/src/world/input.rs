use rkyv::{Archive, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

/// Most recent control state of one ship. Holds its value across ticks until a key edge changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Input {
    pub accel: i8,
    pub turn: i8,
    pub fire: bool,
}

impl Input {
    /// Applies a key edge. A release clears the whole axis, even if the opposite key is still held.
    pub fn set_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Up => self.accel = if pressed { 1 } else { 0 },
            Key::Down => self.accel = if pressed { -1 } else { 0 },
            Key::Left => self.turn = if pressed { -1 } else { 0 },
            Key::Right => self.turn = if pressed { 1 } else { 0 },
            Key::Fire => self.fire = pressed,
        }
    }

    /// Clamps both axes to -1/0/1.
    pub fn normalized(self) -> Self {
        Self {
            accel: self.accel.signum(),
            turn: self.turn.signum(),
            fire: self.fire,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_edges_update_axes() {
        let mut input = Input::default();

        input.set_key(Key::Up, true);
        input.set_key(Key::Right, true);
        input.set_key(Key::Fire, true);
        assert_eq!(
            input,
            Input {
                accel: 1,
                turn: 1,
                fire: true
            }
        );

        input.set_key(Key::Down, true);
        assert_eq!(input.accel, -1);

        input.set_key(Key::Up, false);
        assert_eq!(input.accel, 0);

        input.set_key(Key::Left, true);
        assert_eq!(input.turn, -1);
        input.set_key(Key::Left, false);
        input.set_key(Key::Fire, false);
        assert!(input.is_idle());
    }

    #[test]
    fn normalized_clamps_axes() {
        let input = Input {
            accel: 100,
            turn: -7,
            fire: false,
        };
        let clamped = input.normalized();
        assert_eq!(clamped.accel, 1);
        assert_eq!(clamped.turn, -1);
    }
}
