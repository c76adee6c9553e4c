use loam_blocks::BlockFace;
use loam_geom::Vec3;

use crate::atlas::atlas_uvs;
use crate::face::FaceGeometry;

/// Flat vertex streams for one chunk: xyz positions, xyz normals, uv pairs,
/// one light value per vertex, and u32 triangle indices.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub light: Vec<f32>,
    pub idx: Vec<u32>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse across rebuilds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.light.clear();
        self.idx.clear();
    }

    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.light.reserve(n_quads * 4);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Appends one cube face of the voxel at `origin` with a single light level.
    pub fn add_face(&mut self, face: BlockFace, origin: Vec3, texture_id: u16, light: f32) {
        let base = self.vertex_count() as u32;
        let n = face.normal();
        let uvs = atlas_uvs(texture_id);
        for (corner, (u, v)) in face.corners().into_iter().zip(uvs) {
            let p = origin + corner;
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[u, v]);
            self.light.push(light);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}
