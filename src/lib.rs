pub mod catalog;
pub mod config;
pub mod engine;
pub mod resources;
pub mod save;
pub mod state;
pub mod systems;
pub mod web;

pub use catalog::BuildingKind;
pub use config::GameConfig;
pub use engine::{CommandError, CommandOutcome, Engine};
pub use state::{GameState, Plot, GRID_SIZE, PLOT_COUNT};
