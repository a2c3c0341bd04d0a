mod config;
mod step;
mod tick;

pub use config::{GAME_HEIGHT, GAME_SCALE, GAME_WIDTH, SimConfig};
pub use step::{FireControl, simulate, step_asteroid, step_laser, step_ship};
pub use tick::{FixedTimestep, IntervalTimer, parse_interval};
