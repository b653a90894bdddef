use std::path::Path;

use anyhow::Context as _;

use crate::foundation::color::Rgb8;
use crate::foundation::core::Size;
use crate::foundation::error::{HalftoneError, HalftoneResult};

/// The visible output raster: opaque RGBA8, row-major, tightly packed.
///
/// Every render resizes and fully overwrites it, so a canvas carries no state between calls
/// beyond its pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// Empty 0x0 canvas; nothing has been rendered yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas of `size` filled with `color`.
    pub fn filled(size: Size, color: Rgb8) -> Self {
        let mut c = Self::new();
        c.resize(size);
        c.fill(color);
        c
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// `true` until the first successful render.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Reallocate to `size`; contents are unspecified until the next fill.
    pub(crate) fn resize(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
        self.data.resize(size.area() * 4, 0);
    }

    /// Paint every pixel with `color`.
    pub(crate) fn fill(&mut self, color: Rgb8) {
        let px = color.to_rgba8();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Copy into an owned [`image::RgbaImage`].
    pub fn to_rgba_image(&self) -> HalftoneResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| HalftoneError::render("canvas buffer does not match its dimensions"))
    }

    /// Write the current pixels as a PNG snapshot.
    pub fn save_png(&self, path: &Path) -> HalftoneResult<()> {
        if self.is_empty() {
            return Err(HalftoneError::validation(
                "nothing has been rendered to the canvas yet",
            ));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}
