use crate::foundation::error::{HalftoneError, HalftoneResult};

pub use kurbo::Point;

/// Longest edge, in pixels, that the output canvas may have.
pub const MAX_CANVAS_EDGE: u32 = 1920;

/// Pixel dimensions of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl Size {
    /// Construct a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels.
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Scale down so the longer edge is at most `max_edge`, keeping the aspect ratio.
    ///
    /// Sizes already within bounds are returned unchanged. Fractional results truncate.
    pub fn fit_long_edge(self, max_edge: u32) -> Self {
        if self.is_empty() || (self.width <= max_edge && self.height <= max_edge) {
            return self;
        }
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let max = f64::from(max_edge);
        let (w, h) = if w > h {
            (max, max * h / w)
        } else {
            (max * w / h, max)
        };
        Self::new(truncate_px(w), truncate_px(h))
    }

    /// Cap the width at `max_width` and derive the height from the aspect ratio.
    ///
    /// Unlike [`Size::fit_long_edge`] this never looks at the height, so tall sources may
    /// exceed `max_width` vertically.
    pub fn fit_width(self, max_width: u32) -> Self {
        if self.is_empty() {
            return self;
        }
        let width = self.width.min(max_width);
        let height = f64::from(width) * f64::from(self.height) / f64::from(self.width);
        Self::new(width, truncate_px(height))
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn truncate_px(v: f64) -> u32 {
    (v.trunc() as u32).max(1)
}

/// Export and preview cadence as an exact `num/den` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Frames.
    pub num: u32,
    /// Per this many seconds; never zero.
    pub den: u32,
}

impl Fps {
    /// Rejects a zero numerator or denominator.
    pub fn new(num: u32, den: u32) -> HalftoneResult<Self> {
        if den == 0 {
            return Err(HalftoneError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(HalftoneError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds between consecutive frames.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration of one frame.
    pub fn frame_interval(self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.frame_duration_secs())
    }

    /// Timestamp of frame `index` in seconds.
    pub fn frame_time_secs(self, index: u64) -> f64 {
        (index as f64) * self.frame_duration_secs()
    }

    /// Whole frames that fit in `secs`; partial frames are dropped.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
