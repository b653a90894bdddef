use std::path::PathBuf;

use crate::assets::font::AsciiFont;
use crate::assets::source::SourceFrame;
use crate::foundation::core::{MAX_CANVAS_EDGE, Size};
use crate::foundation::error::HalftoneResult;
use crate::render::canvas::Canvas;
use crate::render::cpu::CpuPainter;
use crate::render::params::{AnimationFlags, Mode, RenderParams};
use crate::render::tile::{Tile, TileStyle, renderer_for};

/// What a render call did to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The canvas was resized to `size` and repainted from `tiles` grid cells.
    Drawn {
        /// Canvas dimensions.
        size: Size,
        /// Grid cells visited, clipped edge cells included.
        tiles: usize,
    },
    /// No source is loaded; the canvas is untouched.
    NoSource,
    /// Resolution 0 has no grid; the canvas is untouched.
    ZeroResolution,
}

impl RenderOutcome {
    /// `true` when the canvas was repainted.
    pub fn is_drawn(&self) -> bool {
        matches!(self, RenderOutcome::Drawn { .. })
    }
}

/// The frame pipeline: source frame + parameters in, stylized canvas out.
///
/// Holds only reusable raster contexts and the ASCII font with its glyph layouts; neither
/// affects the pixels produced, so equal inputs always render equal canvases.
#[derive(Debug, Default)]
pub struct Renderer {
    painter: CpuPainter,
    font: Option<AsciiFont>,
    font_path: Option<PathBuf>,
}

impl Renderer {
    /// Renderer that looks up an ASCII font on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer that loads its ASCII font from `path` on first use.
    pub fn with_font_path(path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Use an already loaded ASCII font.
    pub fn set_font(&mut self, font: AsciiFont) {
        self.font = Some(font);
    }

    /// Loaded ASCII font, if any.
    pub fn font(&self) -> Option<&AsciiFont> {
        self.font.as_ref()
    }

    /// Render `source` with the still-image sizing rule (long edge capped at 1920).
    ///
    /// Missing source and zero resolution leave the canvas untouched and are not errors.
    #[tracing::instrument(skip_all, fields(mode = ?params.mode, resolution = params.resolution))]
    pub fn render(
        &mut self,
        source: Option<&SourceFrame>,
        params: &RenderParams,
        flags: AnimationFlags,
        canvas: &mut Canvas,
    ) -> HalftoneResult<RenderOutcome> {
        let Some(source) = source else {
            return Ok(RenderOutcome::NoSource);
        };
        let size = source.output_size();
        self.render_sized(source, size, params, flags, canvas)
    }

    /// Render one video frame: width capped at 1920, no time-varying effects.
    #[tracing::instrument(skip_all, fields(mode = ?params.mode, resolution = params.resolution))]
    pub fn render_video_frame(
        &mut self,
        frame: Option<&SourceFrame>,
        params: &RenderParams,
        canvas: &mut Canvas,
    ) -> HalftoneResult<RenderOutcome> {
        let Some(frame) = frame else {
            return Ok(RenderOutcome::NoSource);
        };
        let size = frame.size().fit_width(MAX_CANVAS_EDGE);
        self.render_sized(frame, size, params, AnimationFlags::STILL, canvas)
    }

    fn render_sized(
        &mut self,
        source: &SourceFrame,
        size: Size,
        params: &RenderParams,
        flags: AnimationFlags,
        canvas: &mut Canvas,
    ) -> HalftoneResult<RenderOutcome> {
        if params.resolution == 0 {
            return Ok(RenderOutcome::ZeroResolution);
        }
        if params.mode == Some(Mode::Ascii) && self.font.is_none() {
            self.font = Some(AsciiFont::discover(self.font_path.as_deref())?);
        }

        canvas.resize(size);
        let offscreen = source.draw_with_contrast(size, params.contrast);
        let pixels = offscreen.as_raw();
        canvas.fill(Mode::background(params.mode));

        let step = params.resolution as usize;
        let tiles = (size.width as usize).div_ceil(step) * (size.height as usize).div_ceil(step);

        if let Some(mode) = params.mode {
            let style = TileStyle::new(params, flags);
            let tile_primitive = renderer_for(mode);
            let width = size.width;
            let primitives = (0..size.height).step_by(step).flat_map(|y| {
                (0..width)
                    .step_by(step)
                    .filter_map(move |x| tile_primitive(&Tile::sample(pixels, width, x, y), &style))
            });
            self.painter.paint(canvas, primitives, self.font.as_mut())?;
        }

        tracing::debug!(%size, tiles, "rendered frame");
        Ok(RenderOutcome::Drawn { size, tiles })
    }
}
