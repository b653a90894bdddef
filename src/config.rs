use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::export::gif::GifSettings;
use crate::export::video::VideoSettings;
use crate::foundation::error::HalftoneResult;
use crate::render::params::RenderParams;

/// Everything a studio session can be configured with. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Initial render parameters.
    pub params: RenderParams,
    /// GIF loop format.
    pub gif: GifSettings,
    /// Video export format.
    pub video: VideoSettings,
    /// ASCII font file; falls back to `HALFTONE_FONT` and system fonts.
    pub font: Option<PathBuf>,
}

impl StudioConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> HalftoneResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg =
            Self::from_json(&text).with_context(|| format!("in config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Parse and validate JSON text.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(text).context("parse config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> HalftoneResult<()> {
        self.params.validate()?;
        self.gif.validate()?;
        self.video.validate()
    }
}
