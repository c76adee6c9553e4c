//! CPU meshing: culled, atlas-textured cube faces lit by their neighbours.
#![forbid(unsafe_code)]

mod atlas;
mod chunk;
mod face;
mod mesh_build;

pub use atlas::{ATLAS_CELL, atlas_cell_origin, atlas_uvs};
pub use chunk::ChunkMeshCPU;
pub use face::{CUBE_CORNERS, FACE_CORNERS, FaceGeometry};
pub use mesh_build::MeshBuild;

use loam_blocks::{BlockFace, BlockRegistry};
use loam_chunk::{Chunk, VoxelSource, VoxelState};
use loam_geom::Vec3;
use loam_world::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Neighbour across `face` from local cell `(x, y, z)`: read from the chunk
/// when inside it, otherwise asked of `source` in world coordinates.
#[inline]
fn neighbor_state(
    chunk: &Chunk,
    source: &dyn VoxelSource,
    x: usize,
    y: usize,
    z: usize,
    face: BlockFace,
) -> Option<VoxelState> {
    let (dx, dy, dz) = face.delta();
    let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
    if let Some(v) = chunk.get_local_checked(nx, ny, nz) {
        return Some(v);
    }
    let (ox, oz) = chunk.coord.origin();
    source.voxel_state_at(ox + nx, ny, oz + nz)
}

/// Clears `out` and emits every solid voxel face that opens onto a
/// transparent neighbour. Faces toward the outside of the world are skipped.
pub fn rebuild_mesh_into(out: &mut MeshBuild, chunk: &Chunk, reg: &BlockRegistry, source: &dyn VoxelSource) {
    assert!(
        chunk.is_populated(),
        "mesh requested for unpopulated chunk {:?}",
        chunk.coord
    );
    out.clear_keep_capacity();
    for y in 0..CHUNK_HEIGHT {
        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let here = chunk.get_local(x, y, z);
                let Some(ty) = reg.get(here.id) else {
                    continue;
                };
                if !ty.solid {
                    continue;
                }
                let origin = Vec3::new(x as f32, y as f32, z as f32);
                for face in BlockFace::ALL {
                    let Some(n) = neighbor_state(chunk, source, x, y, z, face) else {
                        continue;
                    };
                    if reg.is_transparent(n.id) {
                        out.add_face(face, origin, ty.texture_id(face), n.light);
                    }
                }
            }
        }
    }
    log::trace!(
        "meshed chunk ({}, {}): {} quads",
        chunk.coord.cx,
        chunk.coord.cz,
        out.quad_count()
    );
}

/// Quads for a chunk with an open surface and some relief.
const INITIAL_QUAD_CAP: usize = CHUNK_WIDTH * CHUNK_WIDTH * 2;

pub fn build_chunk_mesh(chunk: &Chunk, reg: &BlockRegistry, source: &dyn VoxelSource) -> ChunkMeshCPU {
    let mut mesh = MeshBuild::default();
    mesh.reserve_quads(INITIAL_QUAD_CAP);
    rebuild_mesh_into(&mut mesh, chunk, reg, source);
    ChunkMeshCPU::new(chunk.coord, mesh)
}
