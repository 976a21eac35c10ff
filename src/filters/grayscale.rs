//! Grayscale conversion.
//!
//! Uses ITU-R BT.601 luma coefficients (0.299, 0.587, 0.114). Alpha is
//! ignored when reducing to gray and restored as fully opaque when
//! broadcasting back to RGBA.

use crate::error::{check_len, Result};

/// ITU-R BT.601 luma coefficients
pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// Luma of one RGB triple, rounded to nearest and clamped to 0-255.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let v = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}

/// Convert an RGBA buffer to a single-channel gray buffer.
///
/// # Arguments
/// * `src` - RGBA bytes, length `width * height * 4`
/// * `dst` - Gray bytes, length `width * height`
///
/// # Errors
/// `BufferSizeMismatch` if either length is wrong; `dst` is left untouched.
pub fn rgba_to_gray(src: &[u8], dst: &mut [u8], width: usize, height: usize) -> Result<()> {
    check_len(src.len(), width, height, 4)?;
    check_len(dst.len(), width, height, 1)?;

    for (gray, px) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *gray = luma(px[0], px[1], px[2]);
    }

    Ok(())
}

/// Broadcast a gray buffer into RGBA with alpha set to 255.
pub fn gray_to_rgba(src: &[u8], dst: &mut [u8], width: usize, height: usize) -> Result<()> {
    check_len(src.len(), width, height, 1)?;
    check_len(dst.len(), width, height, 4)?;

    for (px, &v) in dst.chunks_exact_mut(4).zip(src.iter()) {
        px[0] = v;
        px[1] = v;
        px[2] = v;
        px[3] = 255;
    }

    Ok(())
}

/// Allocating form of [`rgba_to_gray`].
pub fn to_gray(src: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let mut gray = vec![0u8; width * height];
    rgba_to_gray(src, &mut gray, width, height)?;
    Ok(gray)
}

/// Allocating form of [`gray_to_rgba`].
pub fn to_rgba(src: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let mut rgba = vec![0u8; width * height * 4];
    gray_to_rgba(src, &mut rgba, width, height)?;
    Ok(rgba)
}
