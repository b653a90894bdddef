use std::path::Path;

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use serde::{Deserialize, Serialize};

use crate::assets::source::SourceFrame;
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::canvas::Canvas;
use crate::render::params::{AnimationFlags, RenderParams};
use crate::render::pipeline::Renderer;
use crate::schedule::cancel::CancelToken;

/// Looping GIF parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GifSettings {
    /// Frames in one loop; phases are spread evenly over one sine period.
    pub frame_count: u32,
    /// Display time per frame in milliseconds.
    pub delay_ms: u32,
    /// Quantizer speed, 1 (best) to 30 (fastest).
    pub speed: i32,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            frame_count: 20,
            delay_ms: 50,
            speed: 10,
        }
    }
}

impl GifSettings {
    pub fn validate(&self) -> HalftoneResult<()> {
        if self.frame_count == 0 {
            return Err(HalftoneError::validation("gif frame_count must be >= 1"));
        }
        if self.delay_ms == 0 {
            return Err(HalftoneError::validation("gif delay_ms must be >= 1"));
        }
        if !(1..=30).contains(&self.speed) {
            return Err(HalftoneError::validation("gif speed must be in 1..=30"));
        }
        Ok(())
    }

    /// Animation phase of frame `index`: `index / frame_count` of a full turn.
    pub fn phase(&self, index: u32) -> f64 {
        (f64::from(index) / f64::from(self.frame_count)) * std::f64::consts::TAU
    }
}

/// Render one loop of the animated preview and encode it as an infinitely looping GIF.
///
/// Frames render synchronously into `canvas` with time-varying effects on. `progress` receives
/// the encoded fraction after every frame; `cancel` is checked before each one.
#[tracing::instrument(skip_all, fields(frames = settings.frame_count))]
pub fn export_gif<P>(
    renderer: &mut Renderer,
    source: &SourceFrame,
    params: &RenderParams,
    canvas: &mut Canvas,
    settings: &GifSettings,
    cancel: &CancelToken,
    mut progress: P,
) -> HalftoneResult<Vec<u8>>
where
    P: FnMut(f64),
{
    settings.validate()?;
    tracing::info!(size = %source.output_size(), "gif export started");

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, settings.speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| HalftoneError::encode(format!("gif repeat: {e}")))?;

        for i in 0..settings.frame_count {
            cancel.check()?;
            let phase = settings.phase(i);
            renderer.render(
                Some(source),
                &params.at_time(phase),
                AnimationFlags::LIVE,
                canvas,
            )?;
            let frame = Frame::from_parts(
                canvas.to_rgba_image()?,
                0,
                0,
                Delay::from_numer_denom_ms(settings.delay_ms, 1),
            );
            encoder
                .encode_frame(frame)
                .map_err(|e| HalftoneError::encode(format!("gif frame {i}: {e}")))?;
            tracing::debug!(frame = i, phase, "gif frame encoded");
            progress(f64::from(i + 1) / f64::from(settings.frame_count));
        }
    }

    tracing::info!(bytes = bytes.len(), "gif export finished");
    Ok(bytes)
}

/// Write encoded bytes, creating parent directories.
pub fn write_asset(path: &Path, bytes: &[u8]) -> HalftoneResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
