//! Rule engine: players, levels, dependency checks and command dispatch.
//!
//! Nothing in here knows about sockets. Output goes to an [`output::Outbox`], chat goes
//! through a [`commands::Broadcast`] implementation, and persistence through
//! [`storage::GameStore`].

pub mod commands;
pub mod dependency;
pub mod errors;
pub mod level;
pub mod loader;
pub mod output;
pub mod player;
pub mod storage;
pub mod world;

pub use commands::{Dispatcher, Flow, MudCommand};
pub use errors::GameError;
pub use level::{Action, Direction, Level};
pub use player::Player;
pub use storage::GameStore;
pub use world::World;

use std::path::Path;

/// Load every level below `dir` and build the room graph.
pub fn load_world<P: AsRef<Path>>(dir: P) -> Result<World, GameError> {
    World::from_levels(loader::load_all_rooms(dir)?)
}
