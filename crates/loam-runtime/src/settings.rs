use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use loam_lighting::LIGHT_FALLOFF;

/// Streaming knobs for a [`crate::WorldGrid`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// Half-width of the active window, in chunks.
    #[serde(default = "default_view_distance")]
    pub view_distance: u32,
    #[serde(default = "default_enable_threading")]
    pub enable_threading: bool,
    #[serde(default = "default_modifications_per_tick")]
    pub modifications_per_tick: usize,
    #[serde(default = "default_chunk_updates_per_tick")]
    pub chunk_updates_per_tick: usize,
    #[serde(default = "default_light_falloff")]
    pub light_falloff: f32,
}

fn default_view_distance() -> u32 {
    5
}
fn default_enable_threading() -> bool {
    true
}
fn default_modifications_per_tick() -> usize {
    200
}
fn default_chunk_updates_per_tick() -> usize {
    1
}
fn default_light_falloff() -> f32 {
    LIGHT_FALLOFF
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_distance: default_view_distance(),
            enable_threading: default_enable_threading(),
            modifications_per_tick: default_modifications_per_tick(),
            chunk_updates_per_tick: default_chunk_updates_per_tick(),
            light_falloff: default_light_falloff(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Settings with the background worker switched off.
    pub fn foreground(self) -> Self {
        Self {
            enable_threading: false,
            ..self
        }
    }
}
