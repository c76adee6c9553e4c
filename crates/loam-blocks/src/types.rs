pub type BlockId = u8;

/// Id 0 is reserved for air in every table.
pub const AIR: BlockId = 0;

/// Cells per side of the square texture atlas.
pub const ATLAS_SIZE_IN_BLOCKS: u32 = 16;

/// Cube faces in table order. Texture slots, face normals, and mesher
/// vertex tables are all indexed by this ordering.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlockFace {
    Front = 0,
    Back = 1,
    Left = 2,
    Right = 3,
    Top = 4,
    Bottom = 5,
}

impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::Front,
        BlockFace::Back,
        BlockFace::Left,
        BlockFace::Right,
        BlockFace::Top,
        BlockFace::Bottom,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    /// Neighbouring solid blocks draw their faces against this block.
    pub transparent: bool,
    /// Fraction of sky light that passes through, in `[0,1]`.
    pub transparency: f32,
    pub textures: [u16; 6],
    /// Opaque handle for UI collaborators; the engine never reads it.
    pub icon: Option<String>,
}

impl BlockType {
    #[inline]
    pub fn texture_id(&self, face: BlockFace) -> u16 {
        self.textures[face.index()]
    }

    /// Light left after a ray passes through this block.
    #[inline]
    pub fn attenuate(&self, light: f32) -> f32 {
        (light - (1.0 - self.transparency)).clamp(0.0, 1.0)
    }
}
