use loam_geom::Vec3;

use crate::CHUNK_WIDTH;

/// Column of voxels `CHUNK_WIDTH` wide on x and z, spanning the full world height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// Chunk owning the voxel column `(x, z)`. Floor division, so -1 maps to chunk -1.
    #[inline]
    pub fn from_voxel(x: i32, z: i32) -> Self {
        let w = CHUNK_WIDTH as i32;
        Self::new(x.div_euclid(w), z.div_euclid(w))
    }

    #[inline]
    pub fn from_world_pos(p: Vec3) -> Self {
        let (x, _, z) = p.floor_i32();
        Self::from_voxel(x, z)
    }

    /// World voxel coordinate of the chunk's `(0, 0)` column.
    #[inline]
    pub fn origin(self) -> (i32, i32) {
        let w = CHUNK_WIDTH as i32;
        (self.cx * w, self.cz * w)
    }

    #[inline]
    pub fn origin_vec(self) -> Vec3 {
        let (x, z) = self.origin();
        Vec3::new(x as f32, 0.0, z as f32)
    }

    /// Splits a world voxel column into its chunk and the local `(x, z)` inside it.
    #[inline]
    pub fn split_voxel(x: i32, z: i32) -> (Self, usize, usize) {
        let w = CHUNK_WIDTH as i32;
        (
            Self::from_voxel(x, z),
            x.rem_euclid(w) as usize,
            z.rem_euclid(w) as usize,
        )
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}
