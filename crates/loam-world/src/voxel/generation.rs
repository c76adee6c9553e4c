//! Per-voxel terrain classification: bedrock, biome-blended height, lodes, flora.

mod flora;

pub use flora::{make_cactus, make_tree};

use loam_blocks::{AIR, BlockId};

use super::World;
use super::modification::{DiscardMods, ModSink};
use crate::worldgen::{BiomeParams, FloraKind};

/// Number of voxels directly under the surface that use the subsurface block.
pub const SUBSURFACE_DEPTH: i32 = 3;

/// Height and dominant biome of one world column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnTerrain {
    pub dominant: usize,
    pub dominant_weight: f32,
    pub height: i32,
}

impl World {
    /// Block id at a world voxel, discarding any structure the position would root.
    #[inline]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.generate_voxel(x, y, z, &mut DiscardMods)
    }

    /// Block id at a world voxel; structures rooted here are pushed to `mods`.
    pub fn generate_voxel<S: ModSink + ?Sized>(&self, x: i32, y: i32, z: i32, mods: &mut S) -> BlockId {
        if !self.is_voxel_in_world(x, y, z) {
            return AIR;
        }
        if y == 0 {
            return self.params.bedrock;
        }
        let column = self.column_terrain(x, z);
        self.generate_in_column(&column, x, y, z, mods)
    }

    /// Dominant biome and blended height. The dominant biome is the one with
    /// the strongest weight (first wins on ties); the height averages only
    /// biomes whose weighted contribution is positive.
    pub fn column_terrain(&self, x: i32, z: i32) -> ColumnTerrain {
        let (fx, fz) = (x as f32, z as f32);
        let mut dominant = 0usize;
        let mut dominant_weight = 0.0f32;
        let mut height_sum = 0.0f32;
        let mut contributors = 0u32;
        for (i, biome) in self.params.biomes.iter().enumerate() {
            let weight = self.noise.sample_2d(fx, fz, biome.offset, biome.scale);
            if weight > dominant_weight {
                dominant_weight = weight;
                dominant = i;
            }
            let contribution =
                biome.terrain_height * self.noise.sample_2d(fx, fz, 0.0, biome.terrain_scale) * weight;
            if contribution > 0.0 {
                height_sum += contribution;
                contributors += 1;
            }
        }
        let blended = if contributors > 0 {
            height_sum / contributors as f32
        } else {
            0.0
        };
        ColumnTerrain {
            dominant,
            dominant_weight,
            height: (blended + self.params.solid_ground_height as f32).floor() as i32,
        }
    }

    /// Classification for a voxel whose column terrain is already known.
    /// Callers handle the world bounds and the bedrock floor.
    pub fn generate_in_column<S: ModSink + ?Sized>(
        &self,
        column: &ColumnTerrain,
        x: i32,
        y: i32,
        z: i32,
        mods: &mut S,
    ) -> BlockId {
        let Some(biome) = self.params.biomes.get(column.dominant) else {
            return AIR;
        };
        let h = column.height;
        let mut block = if y == h {
            biome.surface
        } else if y < h && y > h - (SUBSURFACE_DEPTH + 1) {
            biome.subsurface
        } else if y > h {
            return AIR;
        } else {
            self.params.stone
        };

        if block == self.params.stone {
            block = self.apply_lodes(biome, x, y, z, block);
        }

        if y == h {
            self.plant_flora(biome, x, y, z, mods);
        }
        block
    }

    /// Last matching lode wins.
    fn apply_lodes(&self, biome: &BiomeParams, x: i32, y: i32, z: i32, mut block: BlockId) -> BlockId {
        for lode in &biome.lodes {
            if lode.spans(y)
                && self.noise.sample_3d(
                    x as f32,
                    y as f32,
                    z as f32,
                    lode.noise_offset,
                    lode.scale,
                    lode.threshold,
                )
            {
                block = lode.block;
            }
        }
        block
    }

    fn plant_flora<S: ModSink + ?Sized>(&self, biome: &BiomeParams, x: i32, y: i32, z: i32, mods: &mut S) {
        let f = &biome.flora;
        if !f.enabled {
            return;
        }
        let (fx, fz) = (x as f32, z as f32);
        if self.noise.sample_2d(fx, fz, f.zone_offset, f.zone_scale) <= f.zone_threshold {
            return;
        }
        if self.noise.sample_2d(fx, fz, f.placement_offset, f.placement_scale) <= f.placement_threshold {
            return;
        }
        match f.kind {
            FloraKind::Tree => make_tree(&self.noise, f, x, y, z, mods),
            FloraKind::Cactus => make_cactus(&self.noise, f, x, y, z, mods),
        }
    }
}
