//! Per-tile primitive selection.
//!
//! Each mode maps a sampled tile to at most one [`Primitive`]. The mapping is pure; the raster
//! backend decides how primitives become pixels.

use crate::foundation::color::{Rgb8, luma};
use crate::foundation::core::Point;
use crate::render::params::{AnimationFlags, Mode, RenderParams};

/// Brightness ramp for ASCII mode, darkest glyph first after the leading blank.
pub const ASCII_RAMP: [char; 11] = [' ', '@', '%', '#', '*', '+', '=', '-', ':', '.', ' '];

/// Index of the last ramp entry.
pub const ASCII_RAMP_LAST: usize = ASCII_RAMP.len() - 1;

/// LED dots at or below this radius are not drawn.
pub const LED_MIN_RADIUS: f64 = 0.5;

/// One grid cell and its representative sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    /// Left edge in canvas pixels.
    pub x: u32,
    /// Top edge in canvas pixels.
    pub y: u32,
    /// Color sampled at `(x, y)`.
    pub rgb: Rgb8,
    /// Luma of `rgb`.
    pub brightness: f64,
}

impl Tile {
    /// Sample the tile whose top-left corner is `(x, y)` in a straight RGBA8 buffer.
    pub fn sample(pixels: &[u8], width: u32, x: u32, y: u32) -> Self {
        let idx = (y as usize * width as usize + x as usize) * 4;
        let rgb = Rgb8::new(pixels[idx], pixels[idx + 1], pixels[idx + 2]);
        Self {
            x,
            y,
            rgb,
            brightness: luma(rgb.r, rgb.g, rgb.b),
        }
    }

    fn center(&self, res: f64) -> Point {
        Point::new(f64::from(self.x) + res / 2.0, f64::from(self.y) + res / 2.0)
    }
}

/// Drawing primitive produced by a tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Filled circle.
    Circle {
        /// Circle center.
        center: Point,
        /// Radius, never negative.
        radius: f64,
        /// Fill color.
        color: Rgb8,
    },
    /// Filled circle with a blurred halo of the same color underneath.
    GlowCircle {
        /// Circle center.
        center: Point,
        /// Radius, always above [`LED_MIN_RADIUS`].
        radius: f64,
        /// Fill and glow color.
        color: Rgb8,
        /// Shadow blur extent in pixels.
        blur: f64,
    },
    /// Axis-aligned filled square.
    Square {
        /// Square center.
        center: Point,
        /// Edge length, never negative.
        side: f64,
        /// Fill color.
        color: Rgb8,
    },
    /// One glyph from [`ASCII_RAMP`], centered on `center`.
    Glyph {
        /// Glyph center.
        center: Point,
        /// Index into [`ASCII_RAMP`].
        ramp_index: usize,
        /// Font size in whole pixels.
        font_size: u32,
        /// Fill color.
        color: Rgb8,
    },
}

impl Primitive {
    /// Fill color of the primitive.
    pub fn color(&self) -> Rgb8 {
        match *self {
            Primitive::Circle { color, .. }
            | Primitive::GlowCircle { color, .. }
            | Primitive::Square { color, .. }
            | Primitive::Glyph { color, .. } => color,
        }
    }

    /// Radius for circles, half the side for squares, half the font size for glyphs.
    pub fn extent(&self) -> f64 {
        match *self {
            Primitive::Circle { radius, .. } | Primitive::GlowCircle { radius, .. } => radius,
            Primitive::Square { side, .. } => side / 2.0,
            Primitive::Glyph { font_size, .. } => f64::from(font_size) / 2.0,
        }
    }
}

/// Per-render values shared by every tile.
#[derive(Clone, Copy, Debug)]
pub struct TileStyle {
    /// Tile edge in pixels.
    pub resolution: f64,
    /// Radius multiplier after animation modulation.
    pub radius_multiplier: f64,
    /// Duotone color at brightness 0.
    pub duotone_low: Rgb8,
    /// Duotone color at brightness 1.
    pub duotone_high: Rgb8,
    /// Animation phase for ASCII shimmer, `None` when disabled.
    pub ascii_jitter_time: Option<f64>,
}

impl TileStyle {
    /// Resolve the per-render style for `params`.
    pub fn new(params: &RenderParams, flags: AnimationFlags) -> Self {
        let (duotone_low, duotone_high) = params.duotone_colors();
        Self {
            resolution: f64::from(params.resolution),
            radius_multiplier: params.effective_radius_multiplier(flags),
            duotone_low,
            duotone_high,
            ascii_jitter_time: flags.jitter_ascii.then_some(params.time),
        }
    }
}

/// Signature shared by every mode's tile renderer.
pub type TileRenderer = fn(&Tile, &TileStyle) -> Option<Primitive>;

static TILE_RENDERERS: [TileRenderer; Mode::ALL.len()] = [
    classic_tile,
    rgb_tile,
    led_tile,
    squares_tile,
    ascii_tile,
    duotone_tile,
];

/// Renderer for `mode`.
pub fn renderer_for(mode: Mode) -> TileRenderer {
    TILE_RENDERERS[mode.index()]
}

/// Primitive for one tile, or `None` when the mode draws nothing there.
pub fn tile_primitive(mode: Mode, tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    renderer_for(mode)(tile, style)
}

fn classic_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    let radius = (res / 2.0) * (1.0 - tile.brightness) * style.radius_multiplier;
    Some(Primitive::Circle {
        center: tile.center(res),
        radius: radius.max(0.0),
        color: Rgb8::BLACK,
    })
}

fn rgb_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    let radius = (res / 2.2) * tile.brightness * style.radius_multiplier;
    Some(Primitive::Circle {
        center: tile.center(res),
        radius: radius.max(0.0),
        color: tile.rgb,
    })
}

fn led_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    let radius = (res / 2.5) * tile.brightness * style.radius_multiplier;
    (radius > LED_MIN_RADIUS).then(|| Primitive::GlowCircle {
        center: tile.center(res),
        radius,
        color: tile.rgb,
        blur: res * 0.8,
    })
}

fn squares_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    Some(Primitive::Square {
        center: tile.center(res),
        side: (res * tile.brightness * style.radius_multiplier).max(0.0),
        color: tile.rgb,
    })
}

fn ascii_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    let brightness = match style.ascii_jitter_time {
        Some(t) => tile.brightness * ascii_jitter(t, tile.x, tile.y),
        None => tile.brightness,
    };
    let font_size = (res * 0.85 * style.radius_multiplier).floor().max(0.0) as u32;
    Some(Primitive::Glyph {
        center: tile.center(res),
        ramp_index: ascii_ramp_index(brightness),
        font_size,
        color: tile.rgb,
    })
}

fn duotone_tile(tile: &Tile, style: &TileStyle) -> Option<Primitive> {
    let res = style.resolution;
    Some(Primitive::Square {
        center: tile.center(res),
        side: (res * tile.brightness * style.radius_multiplier).max(0.0),
        color: style.duotone_low.lerp(style.duotone_high, tile.brightness),
    })
}

/// Shimmer factor in `[0.4, 1.0]` for the tile at `(x, y)`.
pub fn ascii_jitter(time: f64, x: u32, y: u32) -> f64 {
    0.7 + (time + f64::from(x) * 0.01 + f64::from(y) * 0.01).sin() * 0.3
}

/// Ramp index for `brightness`: bright tiles map towards the front of the ramp.
pub fn ascii_ramp_index(brightness: f64) -> usize {
    let idx = ((1.0 - brightness) * ASCII_RAMP_LAST as f64).floor();
    if idx.is_nan() || idx < 0.0 {
        return 0;
    }
    (idx as usize).min(ASCII_RAMP_LAST)
}

#[cfg(test)]
#[path = "../../tests/unit/render/tile.rs"]
mod tests;
