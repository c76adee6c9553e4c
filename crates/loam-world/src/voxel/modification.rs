use std::collections::VecDeque;

use loam_blocks::BlockId;

use super::ChunkCoord;

/// A deferred single-voxel write addressed in world voxel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelMod {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block: BlockId,
}

impl VoxelMod {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32, block: BlockId) -> Self {
        Self { x, y, z, block }
    }

    #[inline]
    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::from_voxel(self.x, self.z)
    }
}

/// Receives structure writes emitted during generation.
pub trait ModSink {
    fn push_mod(&mut self, m: VoxelMod);
}

impl ModSink for Vec<VoxelMod> {
    #[inline]
    fn push_mod(&mut self, m: VoxelMod) {
        self.push(m);
    }
}

impl ModSink for VecDeque<VoxelMod> {
    #[inline]
    fn push_mod(&mut self, m: VoxelMod) {
        self.push_back(m);
    }
}

/// Sink for read-only queries: structures are only materialized by populate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardMods;

impl ModSink for DiscardMods {
    #[inline]
    fn push_mod(&mut self, _m: VoxelMod) {}
}
