use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use loam_blocks::{AIR, BlockId, BlockRegistry};

#[derive(Clone, Debug, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_world_size_chunks")]
    pub world_size_chunks: u32,
    #[serde(default = "default_solid_ground_height")]
    pub solid_ground_height: i32,
    #[serde(default = "default_stone_block")]
    pub stone_block: String,
    #[serde(default = "default_bedrock_block")]
    pub bedrock_block: String,
    #[serde(default = "default_biomes")]
    pub biomes: Vec<BiomeDef>,
}

fn default_world_size_chunks() -> u32 {
    100
}
fn default_solid_ground_height() -> i32 {
    42
}
fn default_stone_block() -> String {
    "stone".into()
}
fn default_bedrock_block() -> String {
    "bedrock".into()
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            world_size_chunks: default_world_size_chunks(),
            solid_ground_height: default_solid_ground_height(),
            stone_block: default_stone_block(),
            bedrock_block: default_bedrock_block(),
            biomes: default_biomes(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    /// Offset and frequency of this biome's weight field.
    #[serde(default)]
    pub offset: f32,
    #[serde(default = "default_biome_scale")]
    pub scale: f32,
    #[serde(default)]
    pub terrain_height: f32,
    #[serde(default = "default_terrain_scale")]
    pub terrain_scale: f32,
    #[serde(default = "default_surface_block")]
    pub surface_block: String,
    #[serde(default = "default_subsurface_block")]
    pub subsurface_block: String,
    #[serde(default)]
    pub lodes: Vec<LodeDef>,
    #[serde(default)]
    pub flora: FloraDef,
}
fn default_biome_scale() -> f32 {
    0.05
}
fn default_terrain_scale() -> f32 {
    0.25
}
fn default_surface_block() -> String {
    "grass".into()
}
fn default_subsurface_block() -> String {
    "dirt".into()
}

#[derive(Clone, Debug, Deserialize)]
pub struct LodeDef {
    #[serde(default)]
    pub name: String,
    pub block: String,
    /// Exclusive bounds: a lode applies where `min_height < y < max_height`.
    pub min_height: i32,
    pub max_height: i32,
    pub scale: f32,
    pub threshold: f32,
    #[serde(default)]
    pub noise_offset: f32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FloraKind {
    #[default]
    Tree,
    Cactus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FloraDef {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub kind: FloraKind,
    #[serde(default)]
    pub zone_offset: f32,
    #[serde(default = "default_zone_scale")]
    pub zone_scale: f32,
    #[serde(default = "default_zone_threshold")]
    pub zone_threshold: f32,
    #[serde(default = "default_placement_offset")]
    pub placement_offset: f32,
    #[serde(default = "default_placement_scale")]
    pub placement_scale: f32,
    #[serde(default = "default_placement_threshold")]
    pub placement_threshold: f32,
    #[serde(default = "default_flora_min_height")]
    pub min_height: i32,
    #[serde(default = "default_flora_max_height")]
    pub max_height: i32,
    /// Block names; default to log/leaves for trees and cactus/cactus_top for cacti.
    #[serde(default)]
    pub trunk_block: Option<String>,
    #[serde(default)]
    pub crown_block: Option<String>,
}
fn default_zone_scale() -> f32 {
    1.3
}
fn default_zone_threshold() -> f32 {
    0.6
}
fn default_placement_offset() -> f32 {
    250.0
}
fn default_placement_scale() -> f32 {
    15.0
}
fn default_placement_threshold() -> f32 {
    0.8
}
fn default_flora_min_height() -> i32 {
    4
}
fn default_flora_max_height() -> i32 {
    7
}

impl Default for FloraDef {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: FloraKind::Tree,
            zone_offset: 0.0,
            zone_scale: default_zone_scale(),
            zone_threshold: default_zone_threshold(),
            placement_offset: default_placement_offset(),
            placement_scale: default_placement_scale(),
            placement_threshold: default_placement_threshold(),
            min_height: default_flora_min_height(),
            max_height: default_flora_max_height(),
            trunk_block: None,
            crown_block: None,
        }
    }
}

fn default_biomes() -> Vec<BiomeDef> {
    vec![
        BiomeDef {
            name: "grasslands".into(),
            offset: 1234.0,
            scale: 0.042,
            terrain_height: 22.0,
            terrain_scale: 0.15,
            surface_block: "grass".into(),
            subsurface_block: "dirt".into(),
            lodes: vec![
                LodeDef {
                    name: "dirt".into(),
                    block: "dirt".into(),
                    min_height: 1,
                    max_height: 255,
                    scale: 0.1,
                    threshold: 0.5,
                    noise_offset: 0.0,
                },
                LodeDef {
                    name: "coal".into(),
                    block: "coal_ore".into(),
                    min_height: 5,
                    max_height: 60,
                    scale: 0.2,
                    threshold: 0.6,
                    noise_offset: 300.0,
                },
            ],
            flora: FloraDef {
                enabled: true,
                ..FloraDef::default()
            },
        },
        BiomeDef {
            name: "desert".into(),
            offset: 6242.0,
            scale: 0.058,
            terrain_height: 10.0,
            terrain_scale: 0.05,
            surface_block: "sand".into(),
            subsurface_block: "sand".into(),
            lodes: Vec::new(),
            flora: FloraDef {
                enabled: true,
                kind: FloraKind::Cactus,
                zone_scale: 1.06,
                zone_threshold: 0.75,
                placement_scale: 7.5,
                placement_threshold: 0.8,
                min_height: 2,
                max_height: 5,
                ..FloraDef::default()
            },
        },
        BiomeDef {
            name: "forest".into(),
            offset: 21.0,
            scale: 0.06,
            terrain_height: 40.0,
            terrain_scale: 0.1,
            surface_block: "grass".into(),
            subsurface_block: "dirt".into(),
            lodes: Vec::new(),
            flora: FloraDef {
                enabled: true,
                zone_threshold: 0.4,
                min_height: 5,
                max_height: 12,
                ..FloraDef::default()
            },
        },
    ]
}

/// Biome and world parameters with block names resolved against a registry.
#[derive(Clone, Debug)]
pub struct WorldGenParams {
    pub seed: i32,
    pub world_size_chunks: u32,
    pub solid_ground_height: i32,
    pub stone: BlockId,
    pub bedrock: BlockId,
    pub biomes: Vec<BiomeParams>,
}

#[derive(Clone, Debug)]
pub struct BiomeParams {
    pub name: String,
    pub offset: f32,
    pub scale: f32,
    pub terrain_height: f32,
    pub terrain_scale: f32,
    pub surface: BlockId,
    pub subsurface: BlockId,
    pub lodes: Vec<LodeParams>,
    pub flora: FloraParams,
}

#[derive(Clone, Debug)]
pub struct LodeParams {
    pub name: String,
    pub block: BlockId,
    pub min_height: i32,
    pub max_height: i32,
    pub scale: f32,
    pub threshold: f32,
    pub noise_offset: f32,
}

impl LodeParams {
    #[inline]
    pub fn spans(&self, y: i32) -> bool {
        y > self.min_height && y < self.max_height
    }
}

#[derive(Clone, Debug)]
pub struct FloraParams {
    pub enabled: bool,
    pub kind: FloraKind,
    pub zone_offset: f32,
    pub zone_scale: f32,
    pub zone_threshold: f32,
    pub placement_offset: f32,
    pub placement_scale: f32,
    pub placement_threshold: f32,
    pub min_height: i32,
    pub max_height: i32,
    pub trunk: BlockId,
    pub crown: BlockId,
}

fn resolve_block(reg: &BlockRegistry, name: &str, fallback: BlockId, context: &str) -> BlockId {
    match reg.id_by_name(name) {
        Some(id) => id,
        None => {
            log::warn!(
                "worldgen: unknown block '{}' in {}; using '{}'",
                name,
                context,
                reg.name(fallback)
            );
            fallback
        }
    }
}

impl WorldGenParams {
    pub fn from_config(cfg: &WorldGenConfig, reg: &BlockRegistry) -> Self {
        let stone = resolve_block(reg, &cfg.stone_block, AIR, "stone_block");
        let bedrock = resolve_block(reg, &cfg.bedrock_block, stone, "bedrock_block");
        let defs: Vec<BiomeDef> = if cfg.biomes.is_empty() {
            log::warn!("worldgen: biome table is empty; using the default grasslands biome");
            default_biomes().into_iter().take(1).collect()
        } else {
            cfg.biomes.clone()
        };
        let biomes = defs
            .iter()
            .map(|b| BiomeParams::from_def(b, reg, stone))
            .collect();
        Self {
            seed: cfg.seed,
            world_size_chunks: cfg.world_size_chunks.max(1),
            solid_ground_height: cfg.solid_ground_height,
            stone,
            bedrock,
            biomes,
        }
    }

    #[inline]
    pub fn world_size_voxels(&self) -> i32 {
        self.world_size_chunks as i32 * crate::CHUNK_WIDTH as i32
    }
}

impl BiomeParams {
    fn from_def(b: &BiomeDef, reg: &BlockRegistry, stone: BlockId) -> Self {
        let ctx = format!("biome '{}'", b.name);
        let lodes = b
            .lodes
            .iter()
            .map(|l| {
                if l.min_height + 1 >= l.max_height {
                    log::warn!(
                        "worldgen: lode '{}' in {} has an empty height range ({}, {})",
                        l.name,
                        ctx,
                        l.min_height,
                        l.max_height
                    );
                }
                LodeParams {
                    name: l.name.clone(),
                    block: resolve_block(reg, &l.block, stone, &ctx),
                    min_height: l.min_height,
                    max_height: l.max_height,
                    scale: l.scale,
                    threshold: l.threshold,
                    noise_offset: l.noise_offset,
                }
            })
            .collect();
        let f = &b.flora;
        let (trunk_default, crown_default) = match f.kind {
            FloraKind::Tree => ("log", "leaves"),
            FloraKind::Cactus => ("cactus", "cactus_top"),
        };
        let trunk_name = f.trunk_block.as_deref().unwrap_or(trunk_default);
        let crown_name = f.crown_block.as_deref().unwrap_or(crown_default);
        let trunk = resolve_block(reg, trunk_name, stone, &ctx);
        let crown = resolve_block(reg, crown_name, trunk, &ctx);
        let min_height = f.min_height.max(1);
        Self {
            name: b.name.clone(),
            offset: b.offset,
            scale: b.scale,
            terrain_height: b.terrain_height,
            terrain_scale: b.terrain_scale,
            surface: resolve_block(reg, &b.surface_block, stone, &ctx),
            subsurface: resolve_block(reg, &b.subsurface_block, stone, &ctx),
            lodes,
            flora: FloraParams {
                enabled: f.enabled,
                kind: f.kind,
                zone_offset: f.zone_offset,
                zone_scale: f.zone_scale,
                zone_threshold: f.zone_threshold,
                placement_offset: f.placement_offset,
                placement_scale: f.placement_scale,
                placement_threshold: f.placement_threshold,
                min_height,
                max_height: f.max_height.max(min_height),
                trunk,
                crown,
            },
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<WorldGenConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: WorldGenConfig = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn load_params_from_path(path: &Path, reg: &BlockRegistry) -> Result<WorldGenParams, Box<dyn Error>> {
    let cfg = load_config_from_path(path)?;
    Ok(WorldGenParams::from_config(&cfg, reg))
}
