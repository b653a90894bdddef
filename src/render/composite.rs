use crate::foundation::error::{HalftoneError, HalftoneResult};
use crate::foundation::math::scale_by_alpha;

/// Lays a premultiplied RGBA8 layer over `dst` with source-over, pixel by pixel.
pub(crate) fn over_in_place(dst: &mut [u8], layer: &[u8]) -> HalftoneResult<()> {
    if dst.len() != layer.len() || dst.len() % 4 != 0 {
        return Err(HalftoneError::render(format!(
            "cannot composite a {}-byte layer onto a {}-byte canvas",
            layer.len(),
            dst.len()
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        blend_pixel(d, s);
    }
    Ok(())
}

/// Lays a `width`x`height` premultiplied patch over `dst` with its top-left at `(x0, y0)`.
///
/// `dst` is `dst_width` pixels wide. Patch pixels falling outside `dst` are dropped.
pub(crate) fn over_region(
    dst: &mut [u8],
    dst_width: u32,
    patch: &[u8],
    (x0, y0): (i64, i64),
    (width, height): (u32, u32),
) -> HalftoneResult<()> {
    let row_len = width as usize * 4;
    if patch.len() != row_len * height as usize {
        return Err(HalftoneError::render(format!(
            "{}-byte patch does not match {width}x{height}",
            patch.len()
        )));
    }
    let dst_height = (dst.len() / 4).checked_div(dst_width as usize).unwrap_or(0) as i64;
    let dst_width = i64::from(dst_width);
    let (left, right) = (x0.max(0), (x0 + i64::from(width)).min(dst_width));
    if left >= right {
        return Ok(());
    }
    for (row, src_row) in patch.chunks_exact(row_len).enumerate() {
        let y = y0 + row as i64;
        if y < 0 || y >= dst_height {
            continue;
        }
        let d = ((y * dst_width + left) * 4) as usize..((y * dst_width + right) * 4) as usize;
        let s = ((left - x0) * 4) as usize..((right - x0) * 4) as usize;
        for (dp, sp) in dst[d].chunks_exact_mut(4).zip(src_row[s].chunks_exact(4)) {
            blend_pixel(dp, sp);
        }
    }
    Ok(())
}

fn blend_pixel(dst: &mut [u8], src: &[u8]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(src),
        alpha => {
            let keep = 255 - alpha;
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = s.saturating_add(scale_by_alpha(*d, keep));
            }
        }
    }
}
