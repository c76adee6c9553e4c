use loam_world::ChunkCoord;
use thiserror::Error;

/// Failures a caller of [`crate::WorldGrid`] can act on.
#[derive(Error, Debug)]
pub enum GridError {
    /// The position lies outside the world's x/z extent or height.
    #[error("voxel ({x}, {y}, {z}) is outside the world")]
    OutsideWorld { x: i32, y: i32, z: i32 },

    /// The owning chunk has no voxel data yet; edits would be lost on populate.
    #[error("chunk ({}, {}) is not populated", .0.cx, .0.cz)]
    NotPopulated(ChunkCoord),

    #[error("failed to spawn background worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
