//! World sizing, noise sampling, biome configuration, and terrain generation.
#![forbid(unsafe_code)]

pub mod noise;
pub mod voxel;
pub mod worldgen;

pub use noise::NoiseField;
pub use voxel::{ChunkCoord, DiscardMods, ModSink, VoxelMod, World};
pub use worldgen::{BiomeParams, FloraKind, FloraParams, LodeParams, WorldGenConfig, WorldGenParams};

/// Horizontal chunk extent in voxels (x and z).
pub const CHUNK_WIDTH: usize = 16;
/// Vertical extent of every chunk; the world is never chunked along y.
pub const CHUNK_HEIGHT: usize = 128;
pub use loam_blocks::ATLAS_SIZE_IN_BLOCKS;
