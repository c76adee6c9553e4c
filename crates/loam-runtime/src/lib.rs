//! Chunk streaming: the world grid, its update pipeline, and the background worker.
#![forbid(unsafe_code)]

mod error;
mod grid;
mod raycast;
mod settings;
mod shared;
mod worker;

pub use error::GridError;
pub use grid::{DrawEvent, GridStats, WorldGrid};
pub use raycast::{VoxelHit, raycast_first_hit};
pub use settings::Settings;
