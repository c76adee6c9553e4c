//! Chunk voxel storage, generation fill, and queued modifications.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use loam_blocks::{AIR, BlockId};
use loam_world::voxel::generation::ColumnTerrain;
use loam_world::{CHUNK_HEIGHT, CHUNK_WIDTH, ChunkCoord, ModSink, VoxelMod, World};

pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_WIDTH;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoxelState {
    pub id: BlockId,
    /// Sky light in `[0,1]`, written by the lighting pass.
    pub light: f32,
}

impl VoxelState {
    pub const AIR: VoxelState = VoxelState { id: AIR, light: 0.0 };

    #[inline]
    pub const fn new(id: BlockId) -> Self {
        Self { id, light: 0.0 }
    }
}

/// Lifecycle of a chunk's voxel data. Visibility is tracked separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Coordinate known, no voxel array yet.
    Stub,
    /// Voxel array final for this pass; edits and queries read it.
    Populated,
    /// A mesh has been built from the current array.
    Meshed,
}

/// Answers voxel queries that fall outside a single chunk's array.
pub trait VoxelSource {
    /// `None` outside the world.
    fn voxel_state_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelState>;
}

/// Falls back to the generator: block ids are exact, light is unknown (0).
impl VoxelSource for World {
    #[inline]
    fn voxel_state_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelState> {
        if !self.is_voxel_in_world(x, y, z) {
            return None;
        }
        Some(VoxelState::new(self.block_at(x, y, z)))
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    /// Inside the observer's window.
    pub active: bool,
    state: ChunkState,
    voxels: Vec<VoxelState>,
    pending: VecDeque<VoxelMod>,
}

#[inline]
pub fn idx(x: usize, y: usize, z: usize) -> usize {
    (y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x
}

#[inline]
pub fn in_chunk(x: i32, y: i32, z: i32) -> bool {
    let w = CHUNK_WIDTH as i32;
    (0..w).contains(&x) && (0..CHUNK_HEIGHT as i32).contains(&y) && (0..w).contains(&z)
}

/// Fills one chunk's voxels from the generator, pushing any structures it
/// roots to `mods`. Iterates y, then x, then z, which fixes structure order.
pub fn generate_chunk_voxels<S: ModSink + ?Sized>(
    world: &World,
    coord: ChunkCoord,
    mods: &mut S,
) -> Vec<VoxelState> {
    let (ox, oz) = coord.origin();
    let mut columns: Vec<Option<ColumnTerrain>> = Vec::with_capacity(CHUNK_WIDTH * CHUNK_WIDTH);
    for z in 0..CHUNK_WIDTH as i32 {
        for x in 0..CHUNK_WIDTH as i32 {
            let (wx, wz) = (ox + x, oz + z);
            columns.push(
                world
                    .is_voxel_in_world(wx, 0, wz)
                    .then(|| world.column_terrain(wx, wz)),
            );
        }
    }

    let mut voxels = vec![VoxelState::AIR; CHUNK_VOLUME];
    for y in 0..CHUNK_HEIGHT {
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let Some(column) = &columns[z * CHUNK_WIDTH + x] else {
                    continue;
                };
                let (wx, wy, wz) = (ox + x as i32, y as i32, oz + z as i32);
                let id = if y == 0 {
                    world.params.bedrock
                } else {
                    world.generate_in_column(column, wx, wy, wz, mods)
                };
                voxels[idx(x, y, z)].id = id;
            }
        }
    }
    voxels
}

/// Chunks across an x/z border from local column `(lx, lz)`, in face order
/// -z, +z, -x, +x.
pub fn border_neighbors(coord: ChunkCoord, lx: usize, lz: usize) -> Vec<ChunkCoord> {
    let last = CHUNK_WIDTH - 1;
    let mut out = Vec::new();
    if lz == 0 {
        out.push(coord.offset(0, -1));
    }
    if lz == last {
        out.push(coord.offset(0, 1));
    }
    if lx == 0 {
        out.push(coord.offset(-1, 0));
    }
    if lx == last {
        out.push(coord.offset(1, 0));
    }
    out
}

impl Chunk {
    pub fn stub(coord: ChunkCoord) -> Self {
        Self {
            coord,
            active: false,
            state: ChunkState::Stub,
            voxels: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Populated chunk over an explicit array, mainly for tests and tools.
    pub fn from_voxels(coord: ChunkCoord, voxels: Vec<VoxelState>) -> Self {
        let mut c = Self::stub(coord);
        c.install_voxels(voxels);
        c
    }

    #[inline]
    pub fn state(&self) -> ChunkState {
        self.state
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        !matches!(self.state, ChunkState::Stub)
    }

    /// Runs the generator over every cell. Structures land in `mods`, never in neighbours.
    pub fn populate<S: ModSink + ?Sized>(&mut self, world: &World, mods: &mut S) {
        let voxels = generate_chunk_voxels(world, self.coord, mods);
        self.install_voxels(voxels);
    }

    /// Swaps in a fully generated array in one step.
    pub fn install_voxels(&mut self, voxels: Vec<VoxelState>) {
        assert_eq!(
            self.state,
            ChunkState::Stub,
            "chunk {:?} populated twice",
            self.coord
        );
        assert_eq!(voxels.len(), CHUNK_VOLUME, "chunk {:?} array has wrong size", self.coord);
        self.voxels = voxels;
        self.state = ChunkState::Populated;
    }

    #[inline]
    pub fn mark_meshed(&mut self) {
        if self.is_populated() {
            self.state = ChunkState::Meshed;
        }
    }

    #[inline]
    pub fn voxels(&self) -> &[VoxelState] {
        &self.voxels
    }

    #[inline]
    pub fn voxels_mut(&mut self) -> &mut [VoxelState] {
        &mut self.voxels
    }

    /// Panics on a stub or out-of-range cell.
    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> VoxelState {
        self.voxels[idx(x, y, z)]
    }

    /// `None` outside the array or while still a stub.
    #[inline]
    pub fn get_local_checked(&self, x: i32, y: i32, z: i32) -> Option<VoxelState> {
        if !self.is_populated() || !in_chunk(x, y, z) {
            return None;
        }
        Some(self.voxels[idx(x as usize, y as usize, z as usize)])
    }

    /// Local cell for a world voxel, if it lies in this chunk.
    #[inline]
    pub fn world_to_local(&self, wx: i32, wy: i32, wz: i32) -> Option<(usize, usize, usize)> {
        let (ox, oz) = self.coord.origin();
        let (lx, lz) = (wx - ox, wz - oz);
        in_chunk(lx, wy, lz).then_some((lx as usize, wy as usize, lz as usize))
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<VoxelState> {
        if !self.is_populated() {
            return None;
        }
        let (x, y, z) = self.world_to_local(wx, wy, wz)?;
        Some(self.get_local(x, y, z))
    }

    #[inline]
    pub fn queue_modification(&mut self, m: VoxelMod) {
        self.pending.push_back(m);
    }

    #[inline]
    pub fn pending_modifications(&self) -> usize {
        self.pending.len()
    }

    /// Drains queued writes in FIFO order. Returns how many were applied.
    pub fn apply_queued_modifications(&mut self) -> usize {
        assert!(
            self.is_populated(),
            "modifications applied to unpopulated chunk {:?}",
            self.coord
        );
        let mut applied = 0;
        while let Some(m) = self.pending.pop_front() {
            let Some((x, y, z)) = self.world_to_local(m.x, m.y, m.z) else {
                panic!(
                    "modification at ({}, {}, {}) routed to chunk {:?}",
                    m.x, m.y, m.z, self.coord
                );
            };
            self.voxels[idx(x, y, z)].id = m.block;
            applied += 1;
        }
        applied
    }

    /// Direct write on a populated chunk. Returns the chunks across a border
    /// from the edited cell, which need rebuilding too.
    pub fn edit_voxel(&mut self, wx: i32, wy: i32, wz: i32, id: BlockId) -> Vec<ChunkCoord> {
        assert!(self.is_populated(), "edit on unpopulated chunk {:?}", self.coord);
        let Some((x, y, z)) = self.world_to_local(wx, wy, wz) else {
            panic!("edit at ({wx}, {wy}, {wz}) routed to chunk {:?}", self.coord);
        };
        self.voxels[idx(x, y, z)].id = id;
        if self.state == ChunkState::Meshed {
            self.state = ChunkState::Populated;
        }
        border_neighbors(self.coord, x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_blocks::BlockRegistry;
    use loam_world::WorldGenConfig;

    fn world() -> World {
        let cfg = WorldGenConfig {
            world_size_chunks: 6,
            ..WorldGenConfig::default()
        };
        World::from_config(&cfg, &BlockRegistry::builtin().unwrap())
    }

    #[test]
    fn populate_matches_generator_queries() {
        let w = world();
        let coord = ChunkCoord::new(2, 3);
        let mut chunk = Chunk::stub(coord);
        let mut mods: Vec<VoxelMod> = Vec::new();
        chunk.populate(&w, &mut mods);
        assert_eq!(chunk.state(), ChunkState::Populated);
        let (ox, oz) = coord.origin();
        for y in [0usize, 1, 30, 41, 42, 43, 60, 90, 127] {
            for (x, z) in [(0usize, 0usize), (5, 9), (15, 15)] {
                let got = chunk.get_local(x, y, z).id;
                let want = w.block_at(ox + x as i32, y as i32, oz + z as i32);
                assert_eq!(got, want, "({x},{y},{z})");
            }
        }
        assert!(mods.iter().all(|m| m.y > 0));
    }

    #[test]
    fn chunk_outside_world_populates_as_air() {
        let w = world();
        let mut chunk = Chunk::stub(ChunkCoord::new(-1, 0));
        chunk.populate(&w, &mut Vec::new());
        assert!(chunk.voxels().iter().all(|v| v.id == AIR));
    }

    #[test]
    #[should_panic(expected = "populated twice")]
    fn populate_twice_panics() {
        let w = world();
        let mut chunk = Chunk::stub(ChunkCoord::new(1, 1));
        chunk.populate(&w, &mut Vec::new());
        chunk.populate(&w, &mut Vec::new());
    }

    #[test]
    fn queued_modifications_apply_in_order() {
        let coord = ChunkCoord::new(1, 0);
        let mut chunk = Chunk::from_voxels(coord, vec![VoxelState::AIR; CHUNK_VOLUME]);
        chunk.queue_modification(VoxelMod::new(16, 5, 3, 2));
        chunk.queue_modification(VoxelMod::new(31, 7, 15, 3));
        chunk.queue_modification(VoxelMod::new(16, 5, 3, 4));
        assert_eq!(chunk.pending_modifications(), 3);
        assert_eq!(chunk.apply_queued_modifications(), 3);
        assert_eq!(chunk.get_local(0, 5, 3).id, 4);
        assert_eq!(chunk.get_local(15, 7, 15).id, 3);
        assert_eq!(chunk.pending_modifications(), 0);
    }

    #[test]
    #[should_panic(expected = "routed to chunk")]
    fn misrouted_modification_panics() {
        let mut chunk = Chunk::from_voxels(ChunkCoord::new(0, 0), vec![VoxelState::AIR; CHUNK_VOLUME]);
        chunk.queue_modification(VoxelMod::new(16, 0, 0, 2));
        chunk.apply_queued_modifications();
    }

    #[test]
    #[should_panic(expected = "unpopulated")]
    fn stub_rejects_modifications() {
        let mut chunk = Chunk::stub(ChunkCoord::new(0, 0));
        chunk.queue_modification(VoxelMod::new(0, 0, 0, 2));
        chunk.apply_queued_modifications();
    }

    #[test]
    fn stub_answers_no_queries() {
        let chunk = Chunk::stub(ChunkCoord::new(0, 0));
        assert_eq!(chunk.get_world(0, 0, 0), None);
        assert_eq!(chunk.get_local_checked(0, 0, 0), None);
    }

    #[test]
    fn edit_reports_border_neighbors() {
        let coord = ChunkCoord::new(4, 4);
        let mut chunk = Chunk::from_voxels(coord, vec![VoxelState::AIR; CHUNK_VOLUME]);
        chunk.mark_meshed();
        assert!(chunk.edit_voxel(64 + 5, 10, 64 + 5, 2).is_empty());
        assert_eq!(chunk.state(), ChunkState::Populated);
        assert_eq!(chunk.edit_voxel(64, 10, 64 + 5, 2), vec![coord.offset(-1, 0)]);
        assert_eq!(
            chunk.edit_voxel(64 + 15, 0, 64 + 15, 2),
            vec![coord.offset(0, 1), coord.offset(1, 0)]
        );
        assert_eq!(chunk.get_local(15, 0, 15).id, 2);
    }

    #[test]
    fn world_source_reports_outside_as_none() {
        let w = world();
        assert!(w.voxel_state_at(-1, 10, 10).is_none());
        assert!(w.voxel_state_at(10, 128, 10).is_none());
        assert_eq!(w.voxel_state_at(10, 0, 10).map(|v| v.id), Some(w.params.bedrock));
    }
}
