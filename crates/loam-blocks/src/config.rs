use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u8>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub transparency: Option<f32>,
    #[serde(default)]
    pub textures: Option<FaceTextures>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FaceTextures {
    All(u16),
    PerFace(FaceTextureTable),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaceTextureTable {
    #[serde(default)]
    pub all: Option<u16>,
    #[serde(default)]
    pub front: Option<u16>,
    #[serde(default)]
    pub back: Option<u16>,
    #[serde(default)]
    pub left: Option<u16>,
    #[serde(default)]
    pub right: Option<u16>,
    #[serde(default)]
    pub top: Option<u16>,
    #[serde(default)]
    pub bottom: Option<u16>,
}

impl FaceTextures {
    /// Expands to front, back, left, right, top, bottom.
    pub fn resolve(&self) -> [u16; 6] {
        match self {
            FaceTextures::All(t) => [*t; 6],
            FaceTextures::PerFace(t) => {
                let all = t.all.unwrap_or(0);
                [
                    t.front.unwrap_or(all),
                    t.back.unwrap_or(all),
                    t.left.unwrap_or(all),
                    t.right.unwrap_or(all),
                    t.top.unwrap_or(all),
                    t.bottom.unwrap_or(all),
                ]
            }
        }
    }
}
