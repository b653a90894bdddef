/// Opaque 8-bit RGB triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }

    /// Parse a hex color, falling back to black when the input is malformed.
    pub fn parse_hex_or_black(s: &str) -> Self {
        Self::parse_hex(s).unwrap_or(Self::BLACK)
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between `self` (at `t = 0`) and `other` (at `t = 1`).
    ///
    /// Channels are rounded half-up, so the midpoint of 0 and 255 is 128.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| -> u8 {
            let a = f64::from(a);
            let v = a + (f64::from(b) - a) * t;
            (v + 0.5).floor().clamp(0.0, 255.0) as u8
        };
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }

    /// Opaque RGBA8 bytes.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Perceptual brightness in `[0, 1]` using Rec. 601 luma weights.
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    (f64::from(r) * 0.299 + f64::from(g) * 0.587 + f64::from(b) * 0.114) / 255.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
