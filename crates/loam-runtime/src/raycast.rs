use loam_blocks::{BlockFace, BlockId};
use loam_geom::Vec3;

/// First solid voxel along a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelHit {
    pub block: (i32, i32, i32),
    pub id: BlockId,
    /// Empty cell the ray passed through just before `block`.
    pub place: (i32, i32, i32),
    /// Face of `block` the ray entered through. `None` when the ray starts inside it.
    pub face: Option<BlockFace>,
}

const MAX_STEPS: usize = 512;

#[inline]
fn inv_or_max(v: f32) -> f32 {
    if v.abs() < 1e-8 { f32::MAX } else { 1.0 / v.abs() }
}

#[inline]
fn step_of(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Face of the entered cell that looks back toward `prev`.
fn entry_face(prev: (i32, i32, i32), cur: (i32, i32, i32)) -> Option<BlockFace> {
    match (cur.0 - prev.0, cur.1 - prev.1, cur.2 - prev.2) {
        (1, 0, 0) => Some(BlockFace::Left),
        (-1, 0, 0) => Some(BlockFace::Right),
        (0, 1, 0) => Some(BlockFace::Bottom),
        (0, -1, 0) => Some(BlockFace::Top),
        (0, 0, 1) => Some(BlockFace::Front),
        (0, 0, -1) => Some(BlockFace::Back),
        _ => None,
    }
}

/// Amanatides-Woo grid walk. `solid_at` returns the block id of a solid voxel
/// and `None` for anything the ray passes through.
pub fn raycast_first_hit<F>(origin: Vec3, dir: Vec3, max_dist: f32, mut solid_at: F) -> Option<VoxelHit>
where
    F: FnMut(i32, i32, i32) -> Option<BlockId>,
{
    let len = dir.length();
    if len < 1e-6 || !len.is_finite() {
        return None;
    }
    let d = dir.normalized();

    let (mut vx, mut vy, mut vz) = origin.floor_i32();
    let (sx, sy, sz) = (step_of(d.x), step_of(d.y), step_of(d.z));
    let (ix, iy, iz) = (inv_or_max(d.x), inv_or_max(d.y), inv_or_max(d.z));
    let tdx = if sx == 0 { f32::MAX } else { ix };
    let tdy = if sy == 0 { f32::MAX } else { iy };
    let tdz = if sz == 0 { f32::MAX } else { iz };

    let frac = |p: f32| p - p.floor();
    let first = |s: i32, f: f32, inv: f32| match s {
        1 => (1.0 - f) * inv,
        -1 => f * inv,
        _ => f32::MAX,
    };
    let mut tmx = first(sx, frac(origin.x), ix);
    let mut tmy = first(sy, frac(origin.y), iy);
    let mut tmz = first(sz, frac(origin.z), iz);

    let mut prev = (vx, vy, vz);
    let mut t = 0.0f32;
    for _ in 0..MAX_STEPS {
        if t > max_dist {
            break;
        }
        let cur = (vx, vy, vz);
        if let Some(id) = solid_at(vx, vy, vz) {
            return Some(VoxelHit {
                block: cur,
                id,
                place: prev,
                face: entry_face(prev, cur),
            });
        }
        prev = cur;
        if tmx < tmy {
            if tmx < tmz {
                vx += sx;
                t = tmx;
                tmx += tdx;
            } else {
                vz += sz;
                t = tmz;
                tmz += tdz;
            }
        } else if tmy < tmz {
            vy += sy;
            t = tmy;
            tmy += tdy;
        } else {
            vz += sz;
            t = tmz;
            tmz += tdz;
        }
    }
    None
}
