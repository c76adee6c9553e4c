//! State reachable from both the foreground tick and the background worker.
//!
//! Lock discipline: a thread holds at most one chunk write lock at a time and
//! never waits on another lock while holding it. Meshing holds its own chunk's
//! read lock while taking neighbour read locks. The update queue mutex is
//! never held across chunk locks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use hashbrown::HashSet;
use loam_blocks::BlockRegistry;
use loam_chunk::{Chunk, VoxelSource, VoxelState, generate_chunk_voxels};
use loam_lighting::recompute_lighting_with;
use loam_mesh_cpu::{ChunkMeshCPU, build_chunk_mesh};
use loam_world::{ChunkCoord, ModSink, VoxelMod, World};

pub(crate) struct ChunkEntry {
    pub chunk: Chunk,
    pub mesh: Option<Arc<ChunkMeshCPU>>,
}

/// Chunks waiting for apply, light, and mesh. Each coordinate is queued at
/// most once and is never handed to two threads at the same time.
#[derive(Default)]
struct UpdateQueue {
    order: VecDeque<ChunkCoord>,
    queued: HashSet<ChunkCoord>,
    in_flight: HashSet<ChunkCoord>,
}

impl UpdateQueue {
    fn push_back(&mut self, c: ChunkCoord) {
        if self.queued.insert(c) {
            self.order.push_back(c);
        }
    }

    fn push_front(&mut self, c: ChunkCoord) {
        if !self.queued.insert(c) {
            if let Some(pos) = self.order.iter().position(|&o| o == c) {
                self.order.remove(pos);
            }
        }
        self.order.push_front(c);
    }

    fn pop(&mut self) -> Option<ChunkCoord> {
        let pos = self.order.iter().position(|c| !self.in_flight.contains(c))?;
        let c = self.order.remove(pos)?;
        self.queued.remove(&c);
        self.in_flight.insert(c);
        Some(c)
    }

    fn finish(&mut self, c: ChunkCoord) {
        self.in_flight.remove(&c);
    }

    fn is_idle(&self) -> bool {
        self.order.is_empty() && self.in_flight.is_empty()
    }
}

/// Forwards generated structure writes to the modification channel.
struct ModChannel<'a>(&'a Sender<VoxelMod>);

impl ModSink for ModChannel<'_> {
    #[inline]
    fn push_mod(&mut self, m: VoxelMod) {
        // The receiver lives in the same struct as the sender, so this cannot fail.
        let _ = self.0.send(m);
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    pub materialized: AtomicUsize,
    pub populated: AtomicUsize,
    pub meshes_built: AtomicUsize,
    pub mods_applied: AtomicUsize,
}

pub(crate) struct GridShared {
    pub world: Arc<World>,
    pub reg: Arc<BlockRegistry>,
    falloff: f32,
    slots: Box<[OnceLock<RwLock<ChunkEntry>>]>,
    updates: Mutex<UpdateQueue>,
    mods_tx: Sender<VoxelMod>,
    pub mods_rx: Receiver<VoxelMod>,
    pub draw_tx: Sender<ChunkCoord>,
    pub draw_rx: Receiver<ChunkCoord>,
    wake_tx: Sender<()>,
    pub wake_rx: Receiver<()>,
    /// Modifications taken off the channel but not yet delivered.
    routing: AtomicUsize,
    pub counters: Counters,
}

#[inline]
pub(crate) fn read(lock: &RwLock<ChunkEntry>) -> RwLockReadGuard<'_, ChunkEntry> {
    lock.read().expect("chunk lock poisoned")
}

#[inline]
pub(crate) fn write(lock: &RwLock<ChunkEntry>) -> RwLockWriteGuard<'_, ChunkEntry> {
    lock.write().expect("chunk lock poisoned")
}

impl GridShared {
    pub fn new(world: Arc<World>, reg: Arc<BlockRegistry>, falloff: f32) -> Self {
        let slots = (0..world.chunk_count()).map(|_| OnceLock::new()).collect();
        let (mods_tx, mods_rx) = unbounded();
        let (draw_tx, draw_rx) = unbounded();
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            world,
            reg,
            falloff,
            slots,
            updates: Mutex::new(UpdateQueue::default()),
            mods_tx,
            mods_rx,
            draw_tx,
            draw_rx,
            wake_tx,
            wake_rx,
            routing: AtomicUsize::new(0),
            counters: Counters::default(),
        }
    }

    fn updates(&self) -> MutexGuard<'_, UpdateQueue> {
        self.updates.lock().expect("update queue poisoned")
    }

    /// Materialized slot for `c`, if any.
    #[inline]
    pub fn slot(&self, c: ChunkCoord) -> Option<&RwLock<ChunkEntry>> {
        let i = self.world.chunk_index(c)?;
        self.slots[i].get()
    }

    /// Slot for `c`, creating a stub if it is absent. `None` outside the world.
    pub fn slot_or_stub(&self, c: ChunkCoord) -> Option<&RwLock<ChunkEntry>> {
        let i = self.world.chunk_index(c)?;
        Some(self.slots[i].get_or_init(|| {
            self.counters.materialized.fetch_add(1, Ordering::Relaxed);
            RwLock::new(ChunkEntry {
                chunk: Chunk::stub(c),
                mesh: None,
            })
        }))
    }

    pub fn is_populated(&self, c: ChunkCoord) -> bool {
        self.slot(c).is_some_and(|l| read(l).chunk.is_populated())
    }

    pub fn wake(&self) {
        // Full means a wake is already pending.
        let _ = self.wake_tx.try_send(());
    }

    pub fn schedule(&self, c: ChunkCoord) {
        self.updates().push_back(c);
        self.wake();
    }

    pub fn schedule_front(&self, c: ChunkCoord) {
        self.updates().push_front(c);
        self.wake();
    }

    pub fn pending_updates(&self) -> usize {
        self.updates().order.len()
    }

    /// Nothing queued, routing, or being processed on any thread.
    pub fn is_idle(&self) -> bool {
        self.routing.load(Ordering::SeqCst) == 0 && self.mods_rx.is_empty() && self.updates().is_idle()
    }

    /// Runs the generator for `c` without holding any lock.
    pub fn generate(&self, c: ChunkCoord) -> (Vec<VoxelState>, Vec<VoxelMod>) {
        let mut mods = Vec::new();
        let voxels = generate_chunk_voxels(&self.world, c, &mut mods);
        (voxels, mods)
    }

    /// Installs a generated array if the slot is still a stub, then forwards
    /// its structures and queues the chunk for update. Returns false when
    /// another thread populated it first.
    pub fn install_generated(&self, c: ChunkCoord, voxels: Vec<VoxelState>, mods: Vec<VoxelMod>) -> bool {
        let Some(lock) = self.slot_or_stub(c) else {
            return false;
        };
        {
            let mut w = write(lock);
            if w.chunk.is_populated() {
                return false;
            }
            w.chunk.install_voxels(voxels);
        }
        self.counters.populated.fetch_add(1, Ordering::Relaxed);
        let mut sink = ModChannel(&self.mods_tx);
        for m in mods {
            sink.push_mod(m);
        }
        self.schedule(c);
        true
    }

    pub fn populate_now(&self, c: ChunkCoord) -> bool {
        if self.is_populated(c) {
            return false;
        }
        let (voxels, mods) = self.generate(c);
        self.install_generated(c, voxels, mods)
    }

    /// Delivers one modification to its chunk. A missing target is created
    /// and populated first; writes outside the world are dropped.
    pub fn route_mod(&self, m: VoxelMod) {
        if !self.world.is_voxel_in_world(m.x, m.y, m.z) {
            log::debug!("dropping modification outside the world at ({}, {}, {})", m.x, m.y, m.z);
            return;
        }
        let c = m.chunk();
        if self.slot(c).is_none() {
            self.populate_now(c);
        }
        let Some(lock) = self.slot_or_stub(c) else {
            return;
        };
        let populated = {
            let mut w = write(lock);
            w.chunk.queue_modification(m);
            w.chunk.is_populated()
        };
        // A stub applies its queue once its creation lands.
        if populated {
            self.schedule(c);
        }
    }

    /// Routes up to `limit` queued modifications. Returns how many were taken.
    pub fn drain_mods(&self, limit: usize) -> usize {
        let mut n = 0;
        while n < limit {
            self.routing.fetch_add(1, Ordering::SeqCst);
            let Ok(m) = self.mods_rx.try_recv() else {
                self.routing.fetch_sub(1, Ordering::SeqCst);
                break;
            };
            self.route_mod(m);
            self.routing.fetch_sub(1, Ordering::SeqCst);
            n += 1;
        }
        n
    }

    /// Pops and processes one pending update. Returns false when none was ready.
    pub fn process_next(&self) -> bool {
        let Some(c) = self.updates().pop() else {
            return false;
        };
        self.process_update(c);
        self.updates().finish(c);
        true
    }

    /// Apply, light, mesh, publish. The finished mesh replaces the old one in
    /// a single step, so readers never observe a partial rebuild.
    fn process_update(&self, c: ChunkCoord) {
        let Some(lock) = self.slot(c) else {
            return;
        };
        {
            let mut w = write(lock);
            if !w.chunk.is_populated() {
                log::debug!("skipping update for stub chunk ({}, {})", c.cx, c.cz);
                return;
            }
            let applied = w.chunk.apply_queued_modifications();
            self.counters.mods_applied.fetch_add(applied, Ordering::Relaxed);
            recompute_lighting_with(&mut w.chunk, &self.reg, self.falloff);
        }
        let mesh = {
            let r = read(lock);
            build_chunk_mesh(&r.chunk, &self.reg, self)
        };
        {
            let mut w = write(lock);
            w.mesh = Some(Arc::new(mesh));
            w.chunk.mark_meshed();
        }
        self.counters.meshes_built.fetch_add(1, Ordering::Relaxed);
        let _ = self.draw_tx.send(c);
    }
}

/// Populated chunks answer authoritatively; anything else asks the generator.
impl VoxelSource for GridShared {
    fn voxel_state_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelState> {
        if !self.world.is_voxel_in_world(x, y, z) {
            return None;
        }
        if let Some(lock) = self.slot(ChunkCoord::from_voxel(x, z)) {
            let r = read(lock);
            if let Some(v) = r.chunk.get_world(x, y, z) {
                return Some(v);
            }
        }
        self.world.voxel_state_at(x, y, z)
    }
}
