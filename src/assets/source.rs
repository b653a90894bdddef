use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{MAX_CANVAS_EDGE, Size};
use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::foundation::math::contrast_channel;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024;

/// File extensions accepted as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v", "ogv"];

/// Which sizing rule a frame follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Decoded still image: long edge capped.
    Still,
    /// One decoded video frame: width capped.
    Video,
}

/// What an intake check recognized a file as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Any still format the `image` crate knows.
    Image,
    /// One of [`VIDEO_EXTENSIONS`].
    Video,
}

/// A decoded frame in straight RGBA8, shared cheaply between renders.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    kind: SourceKind,
    image: Arc<image::RgbaImage>,
}

impl SourceFrame {
    /// Wrap a still image.
    pub fn still(image: image::RgbaImage) -> Self {
        Self {
            kind: SourceKind::Still,
            image: Arc::new(clear_transparent_rgb(image)),
        }
    }

    /// Wrap one video frame.
    pub fn video(image: image::RgbaImage) -> Self {
        Self {
            kind: SourceKind::Video,
            image: Arc::new(image),
        }
    }

    /// Sizing rule of this frame.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Intrinsic dimensions.
    pub fn size(&self) -> Size {
        let (w, h) = self.image.dimensions();
        Size::new(w, h)
    }

    /// Borrow the decoded pixels.
    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Canvas dimensions this frame renders at.
    pub fn output_size(&self) -> Size {
        match self.kind {
            SourceKind::Still => self.size().fit_long_edge(MAX_CANVAS_EDGE),
            SourceKind::Video => self.size().fit_width(MAX_CANVAS_EDGE),
        }
    }

    /// Draw into a fresh bitmap of `size` and apply the contrast filter to the color channels.
    pub fn draw_with_contrast(&self, size: Size, contrast: f64) -> image::RgbaImage {
        let mut out = if size == self.size() {
            self.image.as_ref().clone()
        } else {
            image::imageops::resize(
                self.image.as_ref(),
                size.width,
                size.height,
                image::imageops::FilterType::Triangle,
            )
        };
        if contrast != 1.0 {
            for px in out.pixels_mut() {
                for c in &mut px.0[..3] {
                    *c = contrast_channel(*c, contrast);
                }
            }
        }
        out
    }
}

/// Decode an encoded still image.
pub fn decode_image(bytes: &[u8]) -> HalftoneResult<SourceFrame> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(SourceFrame::still(dyn_img.to_rgba8()))
}

/// Check and decode a still image file.
#[tracing::instrument]
pub fn load_image(path: &Path) -> HalftoneResult<SourceFrame> {
    let kind = check_upload(path)?;
    if kind != MediaKind::Image {
        return Err(HalftoneError::asset(format!(
            "'{}' is a video, not an image",
            path.display()
        )));
    }
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let frame = decode_image(&bytes)?;
    tracing::debug!(size = %frame.size(), "decoded image");
    Ok(frame)
}

/// Classify a file by extension.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaKind::Video);
    }
    image::ImageFormat::from_extension(&ext).map(|_| MediaKind::Image)
}

/// Intake gate: the file must exist, be a known type, and fit under [`MAX_UPLOAD_BYTES`].
pub fn check_upload(path: &Path) -> HalftoneResult<MediaKind> {
    let kind = media_kind(path).ok_or_else(|| {
        HalftoneError::asset(format!(
            "unsupported file type for '{}'",
            path.display()
        ))
    })?;
    let meta = std::fs::metadata(path)
        .map_err(|e| HalftoneError::asset(format!("stat '{}': {e}", path.display())))?;
    check_upload_len(meta.len())?;
    Ok(kind)
}

pub(crate) fn check_upload_len(len: u64) -> HalftoneResult<()> {
    if len > MAX_UPLOAD_BYTES {
        return Err(HalftoneError::asset(format!(
            "file is {len} bytes; the limit is {MAX_UPLOAD_BYTES} bytes (30 MB)"
        )));
    }
    Ok(())
}

// Fully transparent pixels carry no color once drawn.
fn clear_transparent_rgb(mut image: image::RgbaImage) -> image::RgbaImage {
    for px in image.pixels_mut() {
        if px.0[3] == 0 {
            px.0 = [0, 0, 0, 0];
        }
    }
    image
}
