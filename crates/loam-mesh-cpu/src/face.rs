use loam_blocks::BlockFace;
use loam_geom::Vec3;

/// Unit cube corners, indexed by `FACE_CORNERS`.
pub const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 1.0),
];

/// Four cube corners per face in block-face order. Triangles `(0,1,2)` and
/// `(2,3,0)` both wind around the outward normal.
pub const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 2, 6, 4],
    [5, 7, 3, 1],
    [1, 3, 2, 0],
    [4, 6, 7, 5],
    [2, 3, 7, 6],
    [1, 0, 4, 5],
];

/// Geometry of a block face in mesher terms.
pub trait FaceGeometry {
    fn delta(self) -> (i32, i32, i32);
    fn normal(self) -> Vec3;
    fn corners(self) -> [Vec3; 4];
}

impl FaceGeometry for BlockFace {
    #[inline]
    fn delta(self) -> (i32, i32, i32) {
        match self {
            BlockFace::Front => (0, 0, -1),
            BlockFace::Back => (0, 0, 1),
            BlockFace::Left => (-1, 0, 0),
            BlockFace::Right => (1, 0, 0),
            BlockFace::Top => (0, 1, 0),
            BlockFace::Bottom => (0, -1, 0),
        }
    }

    #[inline]
    fn normal(self) -> Vec3 {
        let (x, y, z) = self.delta();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    #[inline]
    fn corners(self) -> [Vec3; 4] {
        FACE_CORNERS[self.index()].map(|c| CUBE_CORNERS[c])
    }
}
