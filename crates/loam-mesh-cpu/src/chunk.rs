use loam_geom::{Aabb, Vec3};
use loam_world::{CHUNK_HEIGHT, CHUNK_WIDTH, ChunkCoord};

use crate::mesh_build::MeshBuild;

/// Finished chunk geometry. Positions are chunk-local; `origin` places them in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    pub bbox: Aabb,
    pub mesh: MeshBuild,
}

impl ChunkMeshCPU {
    pub fn new(coord: ChunkCoord, mesh: MeshBuild) -> Self {
        let origin = coord.origin_vec();
        let extent = Vec3::new(CHUNK_WIDTH as f32, CHUNK_HEIGHT as f32, CHUNK_WIDTH as f32);
        Self {
            coord,
            origin,
            bbox: Aabb::new(origin, origin + extent),
            mesh,
        }
    }
}
