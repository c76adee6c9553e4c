use loam_blocks::ATLAS_SIZE_IN_BLOCKS;

/// Width of one atlas cell in normalized texture space.
pub const ATLAS_CELL: f32 = 1.0 / ATLAS_SIZE_IN_BLOCKS as f32;

/// Normalized origin of an atlas cell. Columns run left to right; rows are
/// counted down from the top edge, so cell 0 has its origin at `v = 1`.
#[inline]
pub fn atlas_cell_origin(texture_id: u16) -> (f32, f32) {
    let n = ATLAS_SIZE_IN_BLOCKS as i32;
    let id = i32::from(texture_id);
    let x = (id % n) as f32 * ATLAS_CELL;
    let y = (n - id / n) as f32 * ATLAS_CELL;
    (x, y)
}

/// UVs for the four corners of a face quad, in `FACE_CORNERS` order.
#[inline]
pub fn atlas_uvs(texture_id: u16) -> [(f32, f32); 4] {
    let (x, y) = atlas_cell_origin(texture_id);
    let s = ATLAS_CELL;
    [(x + s, y - s), (x + s, y), (x, y), (x, y - s)]
}
