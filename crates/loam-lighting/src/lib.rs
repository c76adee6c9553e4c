//! Sky light for a single chunk: per-column scan, then a breadth-first spread.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use loam_blocks::{AIR, BlockRegistry};
use loam_chunk::{Chunk, idx};
use loam_world::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Light lost per hop of the flood fill.
pub const LIGHT_FALLOFF: f32 = 0.08;

/// 6-connected steps in block-face order: front, back, left, right, top, bottom.
const NEIGHBOR_STEPS: [(i32, i32, i32); 6] = [
    (0, 0, -1),
    (0, 0, 1),
    (-1, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LightStats {
    pub seeded: usize,
    pub raised: usize,
}

pub fn recompute_lighting(chunk: &mut Chunk, reg: &BlockRegistry) -> LightStats {
    recompute_lighting_with(chunk, reg, LIGHT_FALLOFF)
}

/// Overwrites every voxel's light. Columns are lit top-down with each
/// non-air block removing `1 - transparency`; every cell brighter than
/// `falloff` then spreads to its neighbours, losing `falloff` per step.
pub fn recompute_lighting_with(chunk: &mut Chunk, reg: &BlockRegistry, falloff: f32) -> LightStats {
    assert!(
        chunk.is_populated(),
        "lighting requested for unpopulated chunk {:?}",
        chunk.coord
    );
    let voxels = chunk.voxels_mut();
    let mut stats = LightStats::default();
    let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();

    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_WIDTH {
            let mut sky = 1.0f32;
            for y in (0..CHUNK_HEIGHT).rev() {
                let v = &mut voxels[idx(x, y, z)];
                if v.id != AIR && sky > 0.0 {
                    sky = reg.get(v.id).map_or(sky, |t| t.attenuate(sky));
                }
                v.light = sky;
                if sky > falloff {
                    queue.push_back((x, y, z));
                }
            }
        }
    }
    stats.seeded = queue.len();

    while let Some((x, y, z)) = queue.pop_front() {
        let spread = voxels[idx(x, y, z)].light - falloff;
        for (dx, dy, dz) in NEIGHBOR_STEPS {
            let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
            if !loam_chunk::in_chunk(nx, ny, nz) {
                continue;
            }
            let n = &mut voxels[idx(nx as usize, ny as usize, nz as usize)];
            if n.light < spread {
                n.light = spread;
                stats.raised += 1;
                if spread > falloff {
                    queue.push_back((nx as usize, ny as usize, nz as usize));
                }
            }
        }
    }
    stats
}
