use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEventKind};

use asteroids::{Input, Key};

/// Terminals without the keyboard enhancement protocol never report releases, so a key
/// counts as released once it stops auto-repeating for this long.
pub const DEFAULT_HOLD_TIMEOUT: Duration = Duration::from_millis(150);

const KEYS: [Key; 5] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Fire];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseMode {
    Reported,
    Timeout(Duration),
}

/// Turns terminal key events into the held-key `Input`.
#[derive(Debug, Clone)]
pub struct KeyTracker {
    mode: ReleaseMode,
    last_seen: [Option<Instant>; KEYS.len()],
    input: Input,
}

impl KeyTracker {
    /// For terminals that report key releases.
    pub fn reported() -> Self {
        Self::with_mode(ReleaseMode::Reported)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_mode(ReleaseMode::Timeout(timeout))
    }

    fn with_mode(mode: ReleaseMode) -> Self {
        Self {
            mode,
            last_seen: [None; KEYS.len()],
            input: Input::default(),
        }
    }

    pub fn input(&self) -> Input {
        self.input
    }

    pub fn map_key(code: KeyCode) -> Option<Key> {
        match code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::Down),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Right),
            KeyCode::Char(' ') => Some(Key::Fire),
            _ => None,
        }
    }

    /// Returns false for keys that do not steer the ship.
    pub fn handle(&mut self, code: KeyCode, kind: KeyEventKind, now: Instant) -> bool {
        let Some(key) = Self::map_key(code) else {
            return false;
        };
        let index = key_index(key);

        match kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.input.set_key(key, true);
                self.last_seen[index] = Some(now);
            }
            KeyEventKind::Release => {
                self.input.set_key(key, false);
                self.last_seen[index] = None;
            }
        }
        true
    }

    /// Releases keys that stopped repeating. No-op when releases are reported.
    pub fn expire(&mut self, now: Instant) {
        let ReleaseMode::Timeout(timeout) = self.mode else {
            return;
        };

        for (index, key) in KEYS.iter().enumerate() {
            let stale = self.last_seen[index].is_some_and(|seen| now.duration_since(seen) > timeout);
            if stale {
                self.input.set_key(*key, false);
                self.last_seen[index] = None;
            }
        }
    }
}

fn key_index(key: Key) -> usize {
    match key {
        Key::Up => 0,
        Key::Down => 1,
        Key::Left => 2,
        Key::Right => 3,
        Key::Fire => 4,
    }
}
