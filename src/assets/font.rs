use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::render::tile::ASCII_RAMP;

/// Environment variable naming the ASCII font file.
pub const FONT_ENV: &str = "HALFTONE_FONT";

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
    // Proportional last resort; glyphs are centered per tile either way.
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Locate an ASCII font: `explicit` first, then [`FONT_ENV`], then well-known system paths.
pub fn discover_font(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os(FONT_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(p));
    }
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Glyph id and pen position inside a laid-out ramp entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PositionedGlyph {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// One ramp character shaped at a fixed size.
#[derive(Clone, Debug, Default)]
pub(crate) struct RampGlyph {
    pub(crate) glyphs: Vec<PositionedGlyph>,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) font_size: f32,
}

/// Every ramp character shaped at one font size, indexed like [`ASCII_RAMP`].
#[derive(Clone, Debug)]
pub(crate) struct GlyphRamp {
    entries: Vec<RampGlyph>,
}

impl GlyphRamp {
    pub(crate) fn get(&self, ramp_index: usize) -> Option<&RampGlyph> {
        self.entries.get(ramp_index)
    }
}

/// Font used by ASCII mode, with shaped ramps cached per font size.
///
/// Layouts depend only on the font bytes and the size, so the cache never changes output.
pub struct AsciiFont {
    family_name: String,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<[u8; 4]>,
    render_font: vello_cpu::peniko::FontData,
    ramps: HashMap<u32, Arc<GlyphRamp>>,
}

impl std::fmt::Debug for AsciiFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsciiFont")
            .field("family_name", &self.family_name)
            .field("cached_sizes", &self.ramps.len())
            .finish()
    }
}

impl AsciiFont {
    /// Read a TTF/OTF/TTC file.
    pub fn from_path(path: &Path) -> HalftoneResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            HalftoneError::asset(format!("read font '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Font from [`discover_font`], or an asset error when none can be found.
    pub fn discover(explicit: Option<&Path>) -> HalftoneResult<Self> {
        let path = discover_font(explicit).ok_or_else(|| {
            HalftoneError::asset(format!(
                "ascii mode needs a font: pass --font or set {FONT_ENV}"
            ))
        })?;
        tracing::debug!(path = %path.display(), "loading ascii font");
        Self::from_path(&path)
    }

    /// Register raw font bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> HalftoneResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| HalftoneError::asset("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| HalftoneError::asset("registered font family has no name"))?
            .to_string();

        Ok(Self {
            family_name,
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            render_font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
            ramps: HashMap::new(),
        })
    }

    /// Family name reported by the font.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn render_font(&self) -> &vello_cpu::peniko::FontData {
        &self.render_font
    }

    /// Shaped ramp at `font_size` pixels; `None` for size 0.
    pub(crate) fn ramp(&mut self, font_size: u32) -> Option<Arc<GlyphRamp>> {
        if font_size == 0 {
            return None;
        }
        if let Some(ramp) = self.ramps.get(&font_size) {
            return Some(ramp.clone());
        }
        let entries = ASCII_RAMP
            .iter()
            .map(|&ch| self.shape(ch, font_size as f32))
            .collect();
        let ramp = Arc::new(GlyphRamp { entries });
        self.ramps.insert(font_size, ramp.clone());
        Some(ramp)
    }

    fn shape(&mut self, ch: char, size_px: f32) -> RampGlyph {
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<[u8; 4]> = builder.build(text);
        layout.break_all_lines(None);

        let mut out = RampGlyph {
            glyphs: Vec::new(),
            width: layout.width(),
            height: layout.height(),
            font_size: size_px,
        };
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                out.font_size = run.run().font_size();
                out.glyphs.extend(run.glyphs().map(|g| PositionedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        out
    }
}
