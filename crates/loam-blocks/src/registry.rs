use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::BlocksConfig;
use super::types::{ATLAS_SIZE_IN_BLOCKS, BlockFace, BlockId, BlockType};

const ATLAS_CELLS: u32 = ATLAS_SIZE_IN_BLOCKS * ATLAS_SIZE_IN_BLOCKS;

const BUILTIN_BLOCKS: &str = include_str!("../../../assets/voxels/blocks.toml");

#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// The block table shipped with the engine.
    pub fn builtin() -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_configs(cfg)
    }

    /// Builds the table. Blocks without an explicit id take the next free id
    /// in declaration order; the final id range must be dense and start with air.
    pub fn from_configs(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut slots: Vec<Option<BlockType>> = Vec::new();
        let mut by_name = HashMap::new();
        let mut next_free: usize = 0;
        for def in cfg.blocks {
            let id = match def.id {
                Some(id) => id as usize,
                None => {
                    while slots.get(next_free).is_some_and(|s| s.is_some()) {
                        next_free += 1;
                    }
                    next_free
                }
            };
            if id > BlockId::MAX as usize {
                return Err(format!("block '{}' needs id {} which exceeds 255", def.name, id).into());
            }
            if slots.len() <= id {
                slots.resize(id + 1, None);
            }
            if let Some(prev) = &slots[id] {
                return Err(
                    format!("block id {} assigned to both '{}' and '{}'", id, prev.name, def.name)
                        .into(),
                );
            }
            if by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name '{}'", def.name).into());
            }
            let solid = def.solid.unwrap_or(true);
            let transparent = def.transparent.unwrap_or(!solid);
            let transparency = def
                .transparency
                .unwrap_or(if transparent { 1.0 } else { 0.0 })
                .clamp(0.0, 1.0);
            let mut textures = def.textures.map(|t| t.resolve()).unwrap_or([0; 6]);
            for (face, tex) in BlockFace::ALL.iter().zip(textures.iter_mut()) {
                if u32::from(*tex) >= ATLAS_CELLS {
                    log::warn!(
                        "block '{}' {:?} texture {} is outside the {}x{} atlas; using 0",
                        def.name,
                        face,
                        tex,
                        ATLAS_SIZE_IN_BLOCKS,
                        ATLAS_SIZE_IN_BLOCKS
                    );
                    *tex = 0;
                }
            }
            by_name.insert(def.name.clone(), id as BlockId);
            slots[id] = Some(BlockType {
                id: id as BlockId,
                name: def.name,
                solid,
                transparent,
                transparency,
                textures,
                icon: def.icon,
            });
        }
        let mut blocks = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(ty) => blocks.push(ty),
                None => return Err(format!("block ids must be dense; id {} is unassigned", i).into()),
            }
        }
        match blocks.first() {
            Some(air) if !air.solid && air.transparent => {}
            Some(other) => {
                return Err(format!("id 0 must be a non-solid transparent air block, got '{}'", other.name).into());
            }
            None => return Err("block table is empty".into()),
        }
        Ok(Self { blocks, by_name })
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    #[inline]
    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Unknown ids read as air.
    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|t| t.solid)
    }

    #[inline]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get(id).is_none_or(|t| t.transparent)
    }

    #[inline]
    pub fn transparency(&self, id: BlockId) -> f32 {
        self.get(id).map_or(1.0, |t| t.transparency)
    }

    #[inline]
    pub fn texture_id(&self, id: BlockId, face: BlockFace) -> u16 {
        self.get(id).map_or(0, |t| t.texture_id(face))
    }

    #[inline]
    pub fn name(&self, id: BlockId) -> &str {
        self.get(id).map_or("unknown", |t| t.name.as_str())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
