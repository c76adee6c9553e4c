mod chunk_coord;
pub mod generation;
mod modification;
mod world;

pub use chunk_coord::ChunkCoord;
pub use modification::{DiscardMods, ModSink, VoxelMod};
pub use world::World;
