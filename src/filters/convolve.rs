//! Convolution engine with clamp-to-edge borders.
//!
//! The traversal mode follows the kernel shape:
//! - 1 x N: horizontal pass (x-axis only)
//! - N x 1: vertical pass (y-axis only)
//! - M x N: full 2D pass
//!
//! Each output sample accumulates `weight * sample` in f32, is rounded with
//! `floor(sum + 0.5)` and clamped to 0-255. Samples outside the image are
//! replaced by the nearest in-bounds pixel.
//!
//! Output rows are independent, so they are computed in parallel with rayon.
//! Every worker reads the untouched source and owns one destination row.

use log::trace;
use ndarray::Array2;
use rayon::prelude::*;

use super::kernel::{Kernel, KernelShape};
use crate::error::{check_len, FilterError, Result};

const MAX_CHANNELS: usize = 4;

/// Weights and geometry of a kernel, flattened once per call.
struct Taps {
    weights: Vec<f32>,
    cols: usize,
    rows: usize,
    shape: KernelShape,
}

impl Taps {
    fn new(kernel: &Kernel) -> Self {
        Self {
            weights: kernel.weights().collect(),
            cols: kernel.width(),
            rows: kernel.height(),
            shape: kernel.shape(),
        }
    }
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

#[inline]
fn round_clamp(v: f32) -> u8 {
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn check_channels(channels: usize) -> Result<()> {
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(FilterError::InvalidParameter(format!(
            "channel count must be 1-{MAX_CHANNELS}, got {channels}"
        )));
    }
    Ok(())
}

/// Accumulate the kernel footprint for every pixel of row `y`.
///
/// `emit(x, acc)` receives the unrounded per-channel sums.
fn accumulate_row<F>(
    taps: &Taps,
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    y: usize,
    mut emit: F,
) where
    F: FnMut(usize, &[f32; MAX_CHANNELS]),
{
    let cols2 = (taps.cols / 2) as isize;
    let rows2 = (taps.rows / 2) as isize;

    match taps.shape {
        KernelShape::Horizontal => {
            let ioffset = y * width;
            for x in 0..width {
                let mut acc = [0.0f32; MAX_CHANNELS];
                for (k, &f) in taps.weights.iter().enumerate() {
                    if f == 0.0 {
                        continue;
                    }
                    let ix = clamp_index(x as isize + k as isize - cols2, width);
                    let offset = (ioffset + ix) * channels;
                    for c in 0..channels {
                        acc[c] += f * src[offset + c] as f32;
                    }
                }
                emit(x, &acc);
            }
        }
        KernelShape::Vertical => {
            for x in 0..width {
                let mut acc = [0.0f32; MAX_CHANNELS];
                for (k, &f) in taps.weights.iter().enumerate() {
                    if f == 0.0 {
                        continue;
                    }
                    let iy = clamp_index(y as isize + k as isize - rows2, height);
                    let offset = (iy * width + x) * channels;
                    for c in 0..channels {
                        acc[c] += f * src[offset + c] as f32;
                    }
                }
                emit(x, &acc);
            }
        }
        KernelShape::Full => {
            for x in 0..width {
                let mut acc = [0.0f32; MAX_CHANNELS];
                for row in 0..taps.rows {
                    let iy = clamp_index(y as isize + row as isize - rows2, height);
                    let ioffset = iy * width;
                    let moffset = row * taps.cols;
                    for col in 0..taps.cols {
                        let f = taps.weights[moffset + col];
                        if f == 0.0 {
                            continue;
                        }
                        let ix = clamp_index(x as isize + col as isize - cols2, width);
                        let offset = (ioffset + ix) * channels;
                        for c in 0..channels {
                            acc[c] += f * src[offset + c] as f32;
                        }
                    }
                }
                emit(x, &acc);
            }
        }
    }
}

/// Convolve without validation; lengths must already be checked.
fn convolve_unchecked(
    taps: &Taps,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
) {
    if width == 0 || height == 0 {
        return;
    }

    dst.par_chunks_mut(width * channels)
        .enumerate()
        .for_each(|(y, out)| {
            accumulate_row(taps, src, width, height, channels, y, |x, acc| {
                let base = x * channels;
                for c in 0..channels {
                    out[base + c] = round_clamp(acc[c]);
                }
            });
        });
}

/// Convolve an interleaved buffer with 1-4 channels.
///
/// Every channel is convolved independently with identical weights.
///
/// # Arguments
/// * `kernel` - Weights; the shape selects horizontal, vertical or full 2D traversal
/// * `src` - Source samples, length `width * height * channels`
/// * `dst` - Destination samples, same length as `src`
///
/// # Errors
/// `InvalidParameter` for an unsupported channel count, `BufferSizeMismatch`
/// if either buffer has the wrong length. `dst` is untouched on error.
pub fn convolve_channels(
    kernel: &Kernel,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<()> {
    check_channels(channels)?;
    check_len(src.len(), width, height, channels)?;
    check_len(dst.len(), width, height, channels)?;

    trace!(
        "convolve {}x{} kernel ({:?}) over {}x{}x{}",
        kernel.width(),
        kernel.height(),
        kernel.shape(),
        width,
        height,
        channels
    );

    convolve_unchecked(&Taps::new(kernel), src, dst, width, height, channels);
    Ok(())
}

/// Convolve an RGBA buffer. R, G, B and A are treated alike.
pub fn convolve(
    kernel: &Kernel,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
) -> Result<()> {
    convolve_channels(kernel, src, dst, width, height, 4)
}

/// Convolve a single-channel gray buffer.
pub fn convolve_gray(
    kernel: &Kernel,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
) -> Result<()> {
    convolve_channels(kernel, src, dst, width, height, 1)
}

/// Two-pass separable convolution.
///
/// Runs the `row` kernel into a temporary buffer, then the `column` kernel
/// from that temporary into `dst`. Both kernels must have the same length so
/// the blur stays isotropic.
pub fn convolve_separable(
    row: &Kernel,
    column: &Kernel,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<()> {
    if row.shape() != KernelShape::Horizontal || column.width() != 1 {
        return Err(FilterError::InvalidParameter(format!(
            "separable pass needs a 1xN row and an Nx1 column kernel, got {}x{} and {}x{}",
            row.width(),
            row.height(),
            column.width(),
            column.height()
        )));
    }
    if row.width() != column.height() {
        return Err(FilterError::InvalidParameter(format!(
            "row and column kernels differ in length: {} vs {}",
            row.width(),
            column.height()
        )));
    }
    check_channels(channels)?;
    check_len(src.len(), width, height, channels)?;
    check_len(dst.len(), width, height, channels)?;

    let mut tmp = vec![0u8; src.len()];
    convolve_unchecked(&Taps::new(row), src, &mut tmp, width, height, channels);
    convolve_unchecked(&Taps::new(column), &tmp, dst, width, height, channels);
    Ok(())
}

/// Convolve a gray buffer into signed f32 samples without rounding or clamping.
///
/// Used for gradient kernels whose responses are negative or exceed 255.
///
/// # Returns
/// Array of shape `(height, width)`
pub fn convolve_gray_f32(
    kernel: &Kernel,
    src: &[u8],
    width: usize,
    height: usize,
) -> Result<Array2<f32>> {
    check_len(src.len(), width, height, 1)?;

    let mut out = vec![0.0f32; width * height];
    if width > 0 && height > 0 {
        let taps = Taps::new(kernel);
        out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            accumulate_row(&taps, src, width, height, 1, y, |x, acc| {
                row[x] = acc[0];
            });
        });
    }

    Array2::from_shape_vec((height, width), out)
        .map_err(|e| FilterError::InvalidParameter(e.to_string()))
}
