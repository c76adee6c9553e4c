use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use hashbrown::HashSet;
use loam_blocks::{BlockId, BlockRegistry};
use loam_chunk::{Chunk, ChunkState, VoxelSource, VoxelState};
use loam_geom::Vec3;
use loam_mesh_cpu::ChunkMeshCPU;
use loam_world::{ChunkCoord, World};
use rayon::prelude::*;

use crate::error::GridError;
use crate::raycast::{VoxelHit, raycast_first_hit};
use crate::settings::Settings;
use crate::shared::{GridShared, read, write};
use crate::worker::Worker;

/// A finished mesh ready for the renderer. `active` tells it whether the
/// chunk is currently inside the observer's window.
#[derive(Clone, Debug)]
pub struct DrawEvent {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    pub active: bool,
    pub mesh: Arc<ChunkMeshCPU>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub materialized: usize,
    pub populated: usize,
    pub active: usize,
    pub pending_create: usize,
    pub pending_update: usize,
    pub mods_queued: usize,
    pub mods_applied: usize,
    pub meshes_built: usize,
}

/// Owns every chunk of a bounded world and streams a square window of them
/// around an observer.
pub struct WorldGrid {
    shared: Arc<GridShared>,
    settings: Settings,
    observer: Option<ChunkCoord>,
    active: HashSet<ChunkCoord>,
    pending_create: VecDeque<ChunkCoord>,
    creating: HashSet<ChunkCoord>,
    worker: Option<Worker>,
    tick: u64,
}

impl WorldGrid {
    pub fn new(world: Arc<World>, reg: Arc<BlockRegistry>, settings: Settings) -> Result<Self, GridError> {
        let shared = Arc::new(GridShared::new(world, reg, settings.light_falloff));
        let worker = if settings.enable_threading {
            Some(Worker::spawn(shared.clone())?)
        } else {
            None
        };
        Ok(Self {
            shared,
            settings,
            observer: None,
            active: HashSet::new(),
            pending_create: VecDeque::new(),
            creating: HashSet::new(),
            worker,
            tick: 0,
        })
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.shared.world
    }

    #[inline]
    pub fn registry(&self) -> &BlockRegistry {
        &self.shared.reg
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn observer_chunk(&self) -> Option<ChunkCoord> {
        self.observer
    }

    #[inline]
    pub fn is_threaded(&self) -> bool {
        self.worker.is_some()
    }

    #[inline]
    pub fn is_active(&self, c: ChunkCoord) -> bool {
        self.active.contains(&c)
    }

    pub fn active_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.active.iter().copied()
    }

    pub fn chunk_state(&self, c: ChunkCoord) -> Option<ChunkState> {
        self.shared.slot(c).map(|l| read(l).chunk.state())
    }

    /// Runs `f` against a materialized chunk under its read lock.
    pub fn with_chunk<R>(&self, c: ChunkCoord, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.shared.slot(c).map(|l| f(&read(l).chunk))
    }

    pub fn mesh(&self, c: ChunkCoord) -> Option<Arc<ChunkMeshCPU>> {
        self.shared.slot(c).and_then(|l| read(l).mesh.clone())
    }

    /// Chunk coordinates the window centred on `center` should keep active:
    /// `[c - vd, c + vd)` per axis, limited to streamable chunks.
    pub fn window(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let vd = self.settings.view_distance as i32;
        let mut out = Vec::with_capacity((4 * vd * vd).max(0) as usize);
        for cz in center.cz - vd..center.cz + vd {
            for cx in center.cx - vd..center.cx + vd {
                let c = ChunkCoord::new(cx, cz);
                if self.shared.world.is_chunk_streamable(c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Populates the whole window around `spawn` before the first frame:
    /// generation in parallel, then modifications and updates to quiescence.
    pub fn generate_initial(&mut self, spawn: Vec3) {
        let center = ChunkCoord::from_world_pos(spawn);
        self.observer = Some(center);
        let coords = self.window(center);
        for &c in &coords {
            if let Some(lock) = self.shared.slot_or_stub(c) {
                write(lock).chunk.active = true;
            }
            self.active.insert(c);
        }
        let shared = &self.shared;
        coords.par_iter().for_each(|&c| {
            if !shared.is_populated(c) {
                let (voxels, mods) = shared.generate(c);
                shared.install_generated(c, voxels, mods);
            }
        });
        self.flush();
        log::info!(
            target: "events",
            "[tick {}] initial window around ({}, {}) ready: {} chunks",
            self.tick,
            center.cx,
            center.cz,
            coords.len()
        );
    }

    /// One foreground step: follow the observer, create at most one chunk,
    /// and when no worker runs, do a bounded share of its work too.
    pub fn tick(&mut self, observer: Vec3) {
        self.tick += 1;
        let c = ChunkCoord::from_world_pos(observer);
        if self.observer != Some(c) {
            self.observer = Some(c);
            self.check_view(c);
        }

        let threaded = self.is_threaded();
        if !threaded {
            self.shared.drain_mods(self.settings.modifications_per_tick);
        }
        self.create_one();
        if !threaded {
            for _ in 0..self.settings.chunk_updates_per_tick {
                if !self.shared.process_next() {
                    break;
                }
            }
        }
        self.check_worker();
    }

    fn create_one(&mut self) {
        let Some(c) = self.pending_create.pop_front() else {
            return;
        };
        self.creating.remove(&c);
        let (voxels, mods) = self.shared.generate(c);
        let n = mods.len();
        if self.shared.install_generated(c, voxels, mods) {
            log::debug!(
                target: "events",
                "[tick {}] created chunk ({}, {}) with {} structure writes",
                self.tick,
                c.cx,
                c.cz,
                n
            );
        }
    }

    fn check_view(&mut self, center: ChunkCoord) {
        let want: HashSet<ChunkCoord> = self.window(center).into_iter().collect();
        let mut entered = 0usize;
        for &c in &want {
            if !self.active.contains(&c) {
                self.activate(c);
                entered += 1;
            }
        }
        let left: Vec<ChunkCoord> = self.active.difference(&want).copied().collect();
        for &c in &left {
            if let Some(lock) = self.shared.slot(c) {
                let has_mesh = {
                    let mut w = write(lock);
                    w.chunk.active = false;
                    w.mesh.is_some()
                };
                if has_mesh {
                    let _ = self.shared.draw_tx.send(c);
                }
            }
        }
        self.active = want;
        log::info!(
            target: "events",
            "[tick {}] window moved to ({}, {}): {} entered, {} left",
            self.tick,
            center.cx,
            center.cz,
            entered,
            left.len()
        );
    }

    fn activate(&mut self, c: ChunkCoord) {
        let Some(lock) = self.shared.slot_or_stub(c) else {
            return;
        };
        let (populated, has_mesh) = {
            let mut w = write(lock);
            w.chunk.active = true;
            (w.chunk.is_populated(), w.mesh.is_some())
        };
        if !populated && self.creating.insert(c) {
            self.pending_create.push_back(c);
        }
        if has_mesh {
            let _ = self.shared.draw_tx.send(c);
        }
    }

    fn check_worker(&mut self) {
        let dead = self.worker.as_ref().is_some_and(Worker::exited_unexpectedly);
        if !dead {
            return;
        }
        if let Some(mut w) = self.worker.take() {
            let panicked = w.reap();
            log::error!(
                target: "events",
                "[tick {}] background worker exited unexpectedly (panicked: {}); continuing in the foreground",
                self.tick,
                panicked
            );
        }
        self.settings.enable_threading = false;
    }

    /// Routes every queued modification and processes every pending update
    /// on the calling thread, waiting for any the worker has in hand.
    pub fn flush(&mut self) {
        loop {
            let routed = self.shared.drain_mods(usize::MAX);
            let built = self.shared.process_next();
            if routed == 0 && !built {
                if self.shared.is_idle() {
                    break;
                }
                std::thread::yield_now();
            }
        }
    }

    /// Meshes published since the last call, one per chunk. Chunks that are
    /// not drawable yet are kept for a later call.
    pub fn drain_draw_events(&self) -> Vec<DrawEvent> {
        let mut seen: HashSet<ChunkCoord> = HashSet::new();
        let mut out = Vec::new();
        let mut retry = Vec::new();
        for c in self.shared.draw_rx.try_iter() {
            if !seen.insert(c) {
                continue;
            }
            let Some(lock) = self.shared.slot(c) else {
                continue;
            };
            let r = read(lock);
            match &r.mesh {
                Some(mesh) if r.chunk.is_populated() => out.push(DrawEvent {
                    coord: c,
                    origin: mesh.origin,
                    active: r.chunk.active,
                    mesh: mesh.clone(),
                }),
                _ => retry.push(c),
            }
        }
        for c in retry {
            let _ = self.shared.draw_tx.send(c);
        }
        out
    }

    /// `None` outside the world. Unpopulated chunks answer from the generator with light 0.
    #[inline]
    pub fn voxel_state_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelState> {
        self.shared.voxel_state_at(x, y, z)
    }

    pub fn is_solid_at(&self, x: i32, y: i32, z: i32) -> bool {
        self.voxel_state_at(x, y, z)
            .is_some_and(|v| self.shared.reg.is_solid(v.id))
    }

    /// False outside the world, so nothing is meshed or seen through the world edge.
    pub fn is_transparent_at(&self, x: i32, y: i32, z: i32) -> bool {
        self.voxel_state_at(x, y, z)
            .is_some_and(|v| self.shared.reg.is_transparent(v.id))
    }

    /// Overwrites one voxel of a populated chunk and schedules it, plus any
    /// chunk across a border from the cell, ahead of background work.
    pub fn edit_voxel(&self, x: i32, y: i32, z: i32, id: BlockId) -> Result<(), GridError> {
        if !self.shared.world.is_voxel_in_world(x, y, z) {
            return Err(GridError::OutsideWorld { x, y, z });
        }
        let c = ChunkCoord::from_voxel(x, z);
        let lock = self.shared.slot(c).ok_or(GridError::NotPopulated(c))?;
        let neighbors = {
            let mut w = write(lock);
            if !w.chunk.is_populated() {
                return Err(GridError::NotPopulated(c));
            }
            w.chunk.edit_voxel(x, y, z, id)
        };
        for n in neighbors {
            if self.shared.is_populated(n) {
                self.shared.schedule_front(n);
            }
        }
        self.shared.schedule_front(c);
        log::debug!(target: "events", "[tick {}] edit ({x}, {y}, {z}) -> {id}", self.tick);
        Ok(())
    }

    pub fn pick_voxel(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<VoxelHit> {
        raycast_first_hit(origin, dir, max_dist, |x, y, z| {
            self.voxel_state_at(x, y, z)
                .filter(|v| self.shared.reg.is_solid(v.id))
                .map(|v| v.id)
        })
    }

    pub fn stats(&self) -> GridStats {
        let k = &self.shared.counters;
        GridStats {
            materialized: k.materialized.load(Ordering::Relaxed),
            populated: k.populated.load(Ordering::Relaxed),
            active: self.active.len(),
            pending_create: self.pending_create.len(),
            pending_update: self.shared.pending_updates(),
            mods_queued: self.shared.mods_rx.len(),
            mods_applied: k.mods_applied.load(Ordering::Relaxed),
            meshes_built: k.meshes_built.load(Ordering::Relaxed),
        }
    }

    /// Stops and joins the worker. Later ticks do all work in the foreground.
    pub fn shutdown(&mut self) {
        if let Some(mut w) = self.worker.take() {
            w.stop();
        }
        self.settings.enable_threading = false;
    }
}

impl Drop for WorldGrid {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_world::WorldGenConfig;

    const FLAT: &str = r#"
seed = 3
world_size_chunks = 8
solid_ground_height = 42

[[biomes]]
name = "flat"
scale = 0.0
terrain_height = 0.0
terrain_scale = 0.0
"#;

    fn flat_grid(settings: Settings) -> WorldGrid {
        let reg = Arc::new(BlockRegistry::builtin().unwrap());
        let cfg: WorldGenConfig = toml::from_str(FLAT).unwrap();
        let world = Arc::new(World::from_config(&cfg, &reg));
        WorldGrid::new(world, reg, settings).unwrap()
    }

    fn centre_of(c: ChunkCoord) -> Vec3 {
        let (ox, oz) = c.origin();
        Vec3::new(ox as f32 + 8.5, 60.0, oz as f32 + 8.5)
    }

    #[test]
    fn dead_worker_hands_over_to_the_foreground() {
        let mut g = flat_grid(
            Settings {
                view_distance: 1,
                ..Settings::default()
            }
            .foreground(),
        );
        g.generate_initial(centre_of(ChunkCoord::new(4, 4)));
        g.worker = Some(Worker::spawn_with(g.shared.clone(), |_, _, _| panic!("worker fault")).unwrap());
        g.settings.enable_threading = true;
        assert!(g.is_threaded());
        while !g.worker.as_ref().is_some_and(Worker::exited_unexpectedly) {
            std::thread::yield_now();
        }

        let next = ChunkCoord::new(4, 5);
        g.tick(centre_of(next));
        assert!(!g.is_threaded());
        assert!(!g.settings().enable_threading);

        let built = g.stats().meshes_built;
        for _ in 0..8 {
            g.tick(centre_of(next));
        }
        for c in [ChunkCoord::new(3, 5), ChunkCoord::new(4, 5)] {
            assert_eq!(g.chunk_state(c), Some(ChunkState::Meshed));
        }
        assert!(g.stats().meshes_built >= built + 2);
        assert!(g.drain_draw_events().iter().any(|e| e.coord == next && e.active));
    }

    #[test]
    fn stopped_worker_is_not_reported_as_dead() {
        let mut g = flat_grid(Settings::default());
        assert!(g.is_threaded());
        if let Some(w) = g.worker.as_mut() {
            w.stop();
        }
        assert!(!g.worker.as_ref().is_some_and(Worker::exited_unexpectedly));
        g.shutdown();
        assert!(!g.is_threaded());
    }
}
