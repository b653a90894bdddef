use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgb8;
use crate::foundation::error::{HalftoneError, HalftoneResult};

/// Visual style applied to every tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Black dots on white, bigger where the source is darker.
    Classic,
    /// Dots in the sampled color, bigger where the source is brighter.
    Rgb,
    /// Colored dots with a soft glow.
    Led,
    /// Colored squares.
    Squares,
    /// One colored glyph per tile from a brightness ramp.
    Ascii,
    /// Squares colored by a two-color gradient.
    Duotone,
}

impl Mode {
    /// Every mode, in table order.
    pub const ALL: [Mode; 6] = [
        Mode::Classic,
        Mode::Rgb,
        Mode::Led,
        Mode::Squares,
        Mode::Ascii,
        Mode::Duotone,
    ];

    /// Stable identifier used by selectors and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Rgb => "rgb",
            Mode::Led => "led",
            Mode::Squares => "squares",
            Mode::Ascii => "ascii",
            Mode::Duotone => "duotone",
        }
    }

    /// Position in [`Mode::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Map a selector string to a mode; unknown selectors yield `None`.
    pub fn from_selector(s: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Canvas fill painted before any tile is drawn.
    pub fn background(mode: Option<Self>) -> Rgb8 {
        match mode {
            Some(Mode::Classic) => Rgb8::WHITE,
            _ => Rgb8::BLACK,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = HalftoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::from_selector(s).ok_or_else(|| {
            HalftoneError::validation(format!(
                "unknown mode '{s}' (expected classic, rgb, led, squares, ascii or duotone)"
            ))
        })
    }
}

/// Which time-varying effects a render applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Scale the radius multiplier by `0.8 + 0.2 * sin(time)`.
    pub modulate_radius: bool,
    /// Shimmer ASCII brightness per tile.
    pub jitter_ascii: bool,
}

impl AnimationFlags {
    /// Static rendering: no time dependence.
    pub const STILL: Self = Self {
        modulate_radius: false,
        jitter_ascii: false,
    };

    /// Animated preview and GIF export.
    pub const LIVE: Self = Self {
        modulate_radius: true,
        jitter_ascii: true,
    };
}

/// Inputs for one render call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// Tile edge in pixels.
    pub resolution: u32,
    /// Scalar applied to every primitive size.
    pub radius_multiplier: f64,
    /// Contrast factor applied to the source before sampling.
    pub contrast: f64,
    /// Active mode, `None` when the selector was not recognized.
    #[serde(with = "mode_selector")]
    pub mode: Option<Mode>,
    /// Animation phase in radians.
    pub time: f64,
    /// Duotone color for brightness 0.
    pub duotone_low: String,
    /// Duotone color for brightness 1.
    pub duotone_high: String,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            resolution: 12,
            radius_multiplier: 1.0,
            contrast: 1.2,
            mode: Some(Mode::Classic),
            time: 0.0,
            duotone_low: "#000000".to_owned(),
            duotone_high: "#ffffff".to_owned(),
        }
    }
}

impl RenderParams {
    /// Set the mode from a selector string; unrecognized strings render background only.
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.mode = Mode::from_selector(selector);
        self
    }

    /// Copy of these parameters at animation phase `time`.
    pub fn at_time(&self, time: f64) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }

    /// Check caller-supplied values.
    ///
    /// The pipeline never calls this; it silently skips a zero resolution instead.
    pub fn validate(&self) -> HalftoneResult<()> {
        if self.resolution == 0 {
            return Err(HalftoneError::validation("resolution must be >= 1"));
        }
        if !self.radius_multiplier.is_finite() || self.radius_multiplier <= 0.0 {
            return Err(HalftoneError::validation(
                "radius_multiplier must be finite and > 0",
            ));
        }
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(HalftoneError::validation("contrast must be finite and > 0"));
        }
        if !self.time.is_finite() {
            return Err(HalftoneError::validation("time must be finite"));
        }
        Ok(())
    }

    /// Parsed duotone endpoints (malformed strings become black).
    pub fn duotone_colors(&self) -> (Rgb8, Rgb8) {
        (
            Rgb8::parse_hex_or_black(&self.duotone_low),
            Rgb8::parse_hex_or_black(&self.duotone_high),
        )
    }

    /// Radius multiplier after optional time modulation.
    pub fn effective_radius_multiplier(&self, flags: AnimationFlags) -> f64 {
        if flags.modulate_radius {
            self.radius_multiplier * (0.8 + self.time.sin() * 0.2)
        } else {
            self.radius_multiplier
        }
    }
}

mod mode_selector {
    use super::Mode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(mode: &Option<Mode>, s: S) -> Result<S::Ok, S::Error> {
        match mode {
            Some(m) => s.serialize_str(m.as_str()),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Mode>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(Mode::from_selector))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/params.rs"]
mod tests;
