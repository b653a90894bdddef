use kurbo::Shape;

use crate::assets::font::AsciiFont;
use crate::foundation::color::Rgb8;
use crate::foundation::core::{Point, Size};
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::blur::GlowKernel;
use crate::render::canvas::Canvas;
use crate::render::composite::{over_in_place, over_region};
use crate::render::tile::Primitive;

/// Rasterizes tile primitives with `vello_cpu` and composites them over the canvas background.
///
/// Plain tiles accumulate on a transparent layer. An LED tile first flushes that layer, then
/// blurs its own dot into a halo on a small patch and lays halo and dot over the canvas as drawn
/// so far, so a later halo may tint earlier tiles.
#[derive(Default)]
pub(crate) struct CpuPainter {
    tiles: Option<vello_cpu::RenderContext>,
    halo: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for CpuPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPainter").finish_non_exhaustive()
    }
}

impl CpuPainter {
    /// Draw `primitives` in order over the already-filled `canvas`.
    pub(crate) fn paint<I>(
        &mut self,
        canvas: &mut Canvas,
        primitives: I,
        mut font: Option<&mut AsciiFont>,
    ) -> HalftoneResult<()>
    where
        I: IntoIterator<Item = Primitive>,
    {
        let (width, height) = surface_dims(canvas.size())?;
        let mut tiles = take_ctx(&mut self.tiles, width, height);
        let mut pending = false;
        let mut drawn = 0usize;

        for prim in primitives {
            match prim {
                Primitive::Circle {
                    center,
                    radius,
                    color,
                } => {
                    if radius <= 0.0 {
                        continue;
                    }
                    fill_circle(&mut tiles, center, radius, color);
                }
                Primitive::GlowCircle {
                    center,
                    radius,
                    color,
                    blur,
                } => {
                    if pending {
                        let layer = rasterize(&mut tiles, width, height);
                        over_in_place(canvas.data_mut(), layer.data_as_u8_slice())?;
                        tiles.reset();
                        pending = false;
                    }
                    self.glow_circle(canvas, center, radius, color, blur)?;
                    drawn += 1;
                    continue;
                }
                Primitive::Square {
                    center,
                    side,
                    color,
                } => {
                    if side <= 0.0 {
                        continue;
                    }
                    let half = side / 2.0;
                    tiles.set_paint(paint_color(color));
                    tiles.fill_rect(&vello_cpu::kurbo::Rect::new(
                        center.x - half,
                        center.y - half,
                        center.x + half,
                        center.y + half,
                    ));
                }
                Primitive::Glyph {
                    center,
                    ramp_index,
                    font_size,
                    color,
                } => {
                    let font = font
                        .as_deref_mut()
                        .ok_or_else(|| HalftoneError::asset("ascii mode requires a font"))?;
                    draw_glyph(&mut tiles, font, center, ramp_index, font_size, color);
                }
            }
            pending = true;
            drawn += 1;
        }

        if pending {
            let layer = rasterize(&mut tiles, width, height);
            over_in_place(canvas.data_mut(), layer.data_as_u8_slice())?;
        }
        self.tiles = Some(tiles);

        tracing::trace!(drawn, "painted tile primitives");
        Ok(())
    }

    /// Halo then dot, both composited straight onto `canvas`.
    fn glow_circle(
        &mut self,
        canvas: &mut Canvas,
        center: Point,
        radius: f64,
        color: Rgb8,
        blur: f64,
    ) -> HalftoneResult<()> {
        if radius <= 0.0 {
            return Ok(());
        }
        let kernel = GlowKernel::for_shadow(blur);
        let margin = kernel.as_ref().map_or(0, GlowKernel::radius);
        let Some(patch) = HaloPatch::around(center, radius, margin, canvas.size()) else {
            return Ok(());
        };
        let (pw, ph) = surface_dims(Size::new(patch.width, patch.height))?;

        let mut ctx = take_ctx(&mut self.halo, pw, ph);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            -patch.x0 as f64,
            -patch.y0 as f64,
        )));
        fill_circle(&mut ctx, center, radius, color);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let dot = rasterize(&mut ctx, pw, ph);
        self.halo = Some(ctx);

        let origin = (patch.x0, patch.y0);
        let dims = (patch.width, patch.height);
        let canvas_width = canvas.width();
        if let Some(kernel) = kernel {
            let halo = kernel.apply(dot.data_as_u8_slice(), patch.width, patch.height)?;
            over_region(canvas.data_mut(), canvas_width, &halo, origin, dims)?;
        }
        over_region(canvas.data_mut(), canvas_width, dot.data_as_u8_slice(), origin, dims)
    }
}

/// Canvas-space window holding one dot plus everything its blur can reach, clipped to the
/// canvas widened by the blur margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HaloPatch {
    x0: i64,
    y0: i64,
    width: u32,
    height: u32,
}

impl HaloPatch {
    fn around(center: Point, radius: f64, margin: u32, canvas: Size) -> Option<Self> {
        let reach = radius + f64::from(margin) + 1.0;
        let m = i64::from(margin);
        let span = |c: f64, extent: u32| {
            let lo = ((c - reach).floor() as i64).max(-m);
            let hi = ((c + reach).ceil() as i64).min(i64::from(extent) + m);
            // The window must still overlap the canvas itself.
            (lo < hi && hi > 0 && lo < i64::from(extent)).then_some((lo, hi))
        };
        let (x0, x1) = span(center.x, canvas.width)?;
        let (y0, y1) = span(center.y, canvas.height)?;
        Some(Self {
            x0,
            y0,
            width: u32::try_from(x1 - x0).ok()?,
            height: u32::try_from(y1 - y0).ok()?,
        })
    }
}

fn surface_dims(size: Size) -> HalftoneResult<(u16, u16)> {
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| HalftoneError::render("canvas width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| HalftoneError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn take_ctx(
    slot: &mut Option<vello_cpu::RenderContext>,
    width: u16,
    height: u16,
) -> vello_cpu::RenderContext {
    let mut ctx = match slot.take() {
        Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
        _ => vello_cpu::RenderContext::new(width, height),
    };
    ctx.reset();
    ctx
}

fn rasterize(ctx: &mut vello_cpu::RenderContext, width: u16, height: u16) -> vello_cpu::Pixmap {
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap
}

fn paint_color(color: Rgb8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255)
}

fn fill_circle(ctx: &mut vello_cpu::RenderContext, center: Point, radius: f64, color: Rgb8) {
    let circle = kurbo::Circle::new(center, radius);
    let mut path = vello_cpu::kurbo::BezPath::new();
    for el in circle.path_elements(0.1) {
        path.push(el);
    }
    ctx.set_paint(paint_color(color));
    ctx.fill_path(&path);
}

fn draw_glyph(
    ctx: &mut vello_cpu::RenderContext,
    font: &mut AsciiFont,
    center: Point,
    ramp_index: usize,
    font_size: u32,
    color: Rgb8,
) {
    let Some(ramp) = font.ramp(font_size) else {
        return;
    };
    let Some(entry) = ramp.get(ramp_index) else {
        return;
    };
    if entry.glyphs.is_empty() {
        return;
    }

    // Center the laid-out box on the tile center.
    let origin_x = center.x - f64::from(entry.width) / 2.0;
    let origin_y = center.y - f64::from(entry.height) / 2.0;
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin_x, origin_y)));
    ctx.set_paint(paint_color(color));
    let glyphs = entry.glyphs.iter().map(|g| vello_cpu::Glyph {
        id: g.id,
        x: g.x,
        y: g.y,
    });
    ctx.glyph_run(font.render_font())
        .font_size(entry.font_size)
        .fill_glyphs(glyphs);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}
