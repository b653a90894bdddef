use crate::foundation::error::{HalftoneError, HalftoneResult};

const ONE_Q16: u32 = 1 << 16;

/// Normalized 1D Gaussian taps in 16.16 fixed point, applied along rows then columns.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GlowKernel {
    taps: Vec<u32>,
}

impl GlowKernel {
    /// Kernel matching a 2D-canvas `shadowBlur` of `blur_px`: `sigma = blur / 2`, cut at 3 sigma.
    ///
    /// Returns `None` when the blur is zero or not finite.
    pub(crate) fn for_shadow(blur_px: f64) -> Option<Self> {
        if !blur_px.is_finite() || blur_px <= 0.0 {
            return None;
        }
        let sigma = blur_px / 2.0;
        Self::gaussian((sigma * 3.0).ceil() as u32, sigma).ok()
    }

    pub(crate) fn gaussian(radius: u32, sigma: f64) -> HalftoneResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(HalftoneError::validation("blur sigma must be > 0"));
        }
        let r = i64::from(radius);
        let two_var = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (-r..=r)
            .map(|d| {
                let d = d as f64;
                (-(d * d) / two_var).exp()
            })
            .collect();
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Err(HalftoneError::render("gaussian kernel sum is zero"));
        }

        let mut taps: Vec<u32> = raw
            .iter()
            .map(|w| (w / total * f64::from(ONE_Q16)).round() as u32)
            .collect();
        // Rounding drift goes to the center tap so the kernel sums to exactly one.
        let drift = i64::from(ONE_Q16) - taps.iter().map(|&t| i64::from(t)).sum::<i64>();
        let center = taps.len() / 2;
        taps[center] = (i64::from(taps[center]) + drift).clamp(0, i64::from(ONE_Q16)) as u32;
        Ok(Self { taps })
    }

    pub(crate) fn radius(&self) -> u32 {
        (self.taps.len() / 2) as u32
    }

    /// Blurs a premultiplied RGBA8 buffer. Taps outside the buffer read as transparent.
    pub(crate) fn apply(&self, src: &[u8], width: u32, height: u32) -> HalftoneResult<Vec<u8>> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| HalftoneError::render("glow layer too large"))?;
        if src.len() != len {
            return Err(HalftoneError::render(format!(
                "glow layer is {} bytes, expected {len} for {width}x{height}",
                src.len()
            )));
        }
        if self.taps.len() == 1 {
            return Ok(src.to_vec());
        }

        let (w, h) = (width as usize, height as usize);
        let mut rows = vec![0u8; len];
        for y in 0..h {
            let line = y * w;
            self.convolve(src, &mut rows, w, |i| (line + i) * 4);
        }
        let mut out = vec![0u8; len];
        for x in 0..w {
            self.convolve(&rows, &mut out, h, |i| (i * w + x) * 4);
        }
        Ok(out)
    }

    /// One 1D pass over `count` pixels whose byte offsets come from `offset`.
    fn convolve(&self, src: &[u8], dst: &mut [u8], count: usize, offset: impl Fn(usize) -> usize) {
        let r = self.taps.len() / 2;
        for i in 0..count {
            let mut sum = [0u64; 4];
            let first = i.saturating_sub(r);
            let last = (i + r).min(count - 1);
            for j in first..=last {
                let tap = u64::from(self.taps[j + r - i]);
                let at = offset(j);
                for (acc, &v) in sum.iter_mut().zip(&src[at..at + 4]) {
                    *acc += tap * u64::from(v);
                }
            }
            let at = offset(i);
            for (d, acc) in dst[at..at + 4].iter_mut().zip(sum) {
                *d = ((acc + u64::from(ONE_Q16 / 2)) >> 16).min(255) as u8;
            }
        }
    }
}
