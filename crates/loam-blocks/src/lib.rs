//! Block table: per-id solidity, transparency, and face textures.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::BlockRegistry;
pub use types::{AIR, ATLAS_SIZE_IN_BLOCKS, BlockFace, BlockId, BlockType};
