/// `a * b / 255`, rounded to nearest.
pub(crate) fn scale_by_alpha(a: u8, b: u8) -> u8 {
    ((u32::from(a) * u32::from(b) + 127) / 255) as u8
}

/// Map a contrast factor onto one 8-bit channel, matching a CSS `contrast()` filter.
pub(crate) fn contrast_channel(v: u8, contrast: f64) -> u8 {
    let x = (f64::from(v) / 255.0 - 0.5) * contrast + 0.5;
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}
