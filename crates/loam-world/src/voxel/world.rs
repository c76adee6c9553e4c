use loam_blocks::BlockRegistry;

use super::ChunkCoord;
use crate::noise::NoiseField;
use crate::worldgen::{WorldGenConfig, WorldGenParams};
use crate::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Deterministic terrain source for a square world of `world_size_chunks` per side.
#[derive(Debug)]
pub struct World {
    pub seed: i32,
    pub world_size_chunks: u32,
    pub noise: NoiseField,
    pub params: WorldGenParams,
}

impl World {
    pub fn new(params: WorldGenParams) -> Self {
        Self {
            seed: params.seed,
            world_size_chunks: params.world_size_chunks,
            noise: NoiseField::new(params.seed),
            params,
        }
    }

    pub fn from_config(cfg: &WorldGenConfig, reg: &BlockRegistry) -> Self {
        Self::new(WorldGenParams::from_config(cfg, reg))
    }

    #[inline]
    pub fn world_size_voxels(&self) -> i32 {
        self.world_size_chunks as i32 * CHUNK_WIDTH as i32
    }

    #[inline]
    pub fn is_voxel_in_world(&self, x: i32, y: i32, z: i32) -> bool {
        let size = self.world_size_voxels();
        (0..size).contains(&x) && (0..CHUNK_HEIGHT as i32).contains(&y) && (0..size).contains(&z)
    }

    /// Chunk has a storage slot.
    #[inline]
    pub fn is_chunk_in_world(&self, c: ChunkCoord) -> bool {
        let size = self.world_size_chunks as i32;
        (0..size).contains(&c.cx) && (0..size).contains(&c.cz)
    }

    /// Chunk may be streamed in by the view window. The outermost ring is
    /// only materialized when a structure spills into it.
    #[inline]
    pub fn is_chunk_streamable(&self, c: ChunkCoord) -> bool {
        let size = self.world_size_chunks as i32;
        c.cx > 0 && c.cx < size - 1 && c.cz > 0 && c.cz < size - 1
    }

    /// Row-major slot index for a chunk, or `None` outside the world.
    #[inline]
    pub fn chunk_index(&self, c: ChunkCoord) -> Option<usize> {
        if !self.is_chunk_in_world(c) {
            return None;
        }
        Some(c.cz as usize * self.world_size_chunks as usize + c.cx as usize)
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        let n = self.world_size_chunks as usize;
        n * n
    }

    /// Chunk containing the centre column of the world.
    #[inline]
    pub fn center_chunk(&self) -> ChunkCoord {
        let c = (self.world_size_chunks / 2) as i32;
        ChunkCoord::new(c, c)
    }
}
