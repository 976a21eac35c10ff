//! Canny edge detector.
//!
//! Four stages run in order, once per invocation:
//! 1. Smooth: RGBA to gray, separable Gaussian blur
//! 2. Gradient: Sobel X/Y, magnitude and direction ([`GradientField`])
//! 3. Non-maximum suppression along the quantized gradient direction
//! 4. Hysteresis thresholding relative to the strongest suppressed response
//!
//! Hysteresis is a single pass: a weak pixel becomes an edge only when one of
//! its 8 neighbours is strong. Weak chains more than one hop away from a
//! strong pixel are not promoted.

use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::blur::gaussian_blur_gray;
use super::edge::GradientField;
use super::grayscale::{gray_to_rgba, to_gray};
use super::FilterFn;
use crate::error::{check_len, check_positive_radius, FilterError, Result};

/// Default hysteresis ratios, relative to the strongest suppressed magnitude
pub const DEFAULT_LOW_RATIO: f32 = 0.075;
pub const DEFAULT_HIGH_RATIO: f32 = 0.175;
pub const DEFAULT_GAUSSIAN_RADIUS: f32 = 2.0;

/// Largest accepted hysteresis ratio
pub const MAX_RATIO: f32 = 0.5;

/// Canny parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Radius of the smoothing blur, > 0
    pub gaussian_radius: f32,
    /// Weak threshold as a fraction of the maximum magnitude
    pub low_ratio: f32,
    /// Strong threshold as a fraction of the maximum magnitude
    pub high_ratio: f32,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            gaussian_radius: DEFAULT_GAUSSIAN_RADIUS,
            low_ratio: DEFAULT_LOW_RATIO,
            high_ratio: DEFAULT_HIGH_RATIO,
        }
    }
}

impl CannyConfig {
    /// Build a validated configuration.
    pub fn new(gaussian_radius: f32, low_ratio: f32, high_ratio: f32) -> Result<Self> {
        let config = Self {
            gaussian_radius,
            low_ratio,
            high_ratio,
        };
        config.validate()?;
        Ok(config)
    }

    /// Radius > 0, both ratios in [0, 0.5] and `low_ratio < high_ratio`.
    pub fn validate(&self) -> Result<()> {
        check_positive_radius(self.gaussian_radius)?;
        check_ratio_pair(self.low_ratio, self.high_ratio)
    }
}

fn check_ratio_pair(low_ratio: f32, high_ratio: f32) -> Result<()> {
    for (name, ratio) in [("low", low_ratio), ("high", high_ratio)] {
        if !(0.0..=MAX_RATIO).contains(&ratio) {
            return Err(FilterError::InvalidParameter(format!(
                "{name} ratio must be in [0, {MAX_RATIO}], got {ratio}"
            )));
        }
    }
    if low_ratio >= high_ratio {
        return Err(FilterError::InvalidParameter(format!(
            "low ratio {low_ratio} must be below high ratio {high_ratio}"
        )));
    }
    Ok(())
}

/// Gradient direction rounded to the nearest multiple of 45 degrees (mod 180).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deg0,
    Deg45,
    Deg90,
    Deg135,
}

impl Direction {
    /// Quantize an angle in [0, 360) using 22.5 degree buckets.
    pub fn quantize(angle: f32) -> Self {
        let a = angle;
        if (22.5..67.5).contains(&a) || (202.5..247.5).contains(&a) {
            Direction::Deg45
        } else if (67.5..112.5).contains(&a) || (247.5..292.5).contains(&a) {
            Direction::Deg90
        } else if (112.5..157.5).contains(&a) || (292.5..337.5).contains(&a) {
            Direction::Deg135
        } else {
            // [0, 22.5), [157.5, 202.5), [337.5, 360]
            Direction::Deg0
        }
    }

    /// `(dx, dy)` offsets of the two neighbours compared during suppression.
    #[inline]
    fn neighbours(self) -> [(isize, isize); 2] {
        match self {
            Direction::Deg0 => [(1, 0), (-1, 0)],
            Direction::Deg45 => [(-1, 1), (1, -1)],
            Direction::Deg90 => [(0, 1), (0, -1)],
            Direction::Deg135 => [(1, 1), (-1, -1)],
        }
    }
}

/// Stage 1: gray conversion followed by a separable Gaussian blur.
pub fn smooth_gray(
    src: &[u8],
    width: usize,
    height: usize,
    gaussian_radius: f32,
) -> Result<Vec<u8>> {
    let gray = to_gray(src, width, height)?;
    let mut blurred = vec![0u8; gray.len()];
    gaussian_blur_gray(&gray, &mut blurred, width, height, gaussian_radius)?;
    Ok(blurred)
}

/// Stage 3: thin the magnitude map along the gradient direction.
///
/// A pixel keeps its magnitude only when it is the maximum among itself and
/// its two neighbours across the edge. The outermost ring stays zero.
pub fn non_max_suppression(field: &GradientField) -> Array2<f32> {
    let (height, width) = field.magnitude.dim();
    let mut out = Array2::<f32>::zeros((height, width));
    if width < 3 || height < 3 {
        return out;
    }

    let magnitude = &field.magnitude;
    let angle = &field.angle;
    // Freshly allocated arrays are contiguous, so the row slices are available
    if let Some(buf) = out.as_slice_mut() {
        buf.par_chunks_mut(width)
            .enumerate()
            .skip(1)
            .take(height - 2)
            .for_each(|(y, row)| {
                for x in 1..width - 1 {
                    let m = magnitude[[y, x]];
                    let keep = Direction::quantize(angle[[y, x]])
                        .neighbours()
                        .iter()
                        .all(|&(dx, dy)| {
                            let ny = (y as isize + dy) as usize;
                            let nx = (x as isize + dx) as usize;
                            m >= magnitude[[ny, nx]]
                        });
                    if keep {
                        row[x] = m;
                    }
                }
            });
    }

    out
}

/// Stage 4: two-threshold edge classification.
///
/// `low = low_ratio * max` and `high = high_ratio * max` where `max` is the
/// largest suppressed magnitude. Interior pixels below `low` are background,
/// above `high` are edges, and in between are edges only if one of their 8
/// neighbours is above `high`.
///
/// # Returns
/// Single-channel mask (0 or 255), length `width * height`
///
/// # Errors
/// `DegenerateInput` when every suppressed magnitude is zero, since both
/// thresholds would collapse to 0. `InvalidParameter` for bad ratios.
pub fn hysteresis_threshold(
    suppressed: &Array2<f32>,
    low_ratio: f32,
    high_ratio: f32,
) -> Result<Vec<u8>> {
    check_ratio_pair(low_ratio, high_ratio)?;

    let (height, width) = suppressed.dim();
    let max = suppressed.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Err(FilterError::DegenerateInput(
            "no gradient anywhere in the image".to_string(),
        ));
    }

    let low = low_ratio * max;
    let high = high_ratio * max;
    debug!("hysteresis: max {max:.2} low {low:.2} high {high:.2}");

    let mut mask = vec![0u8; width * height];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let m = suppressed[[y, x]];
            let edge = if m < low {
                false
            } else if m > high {
                true
            } else {
                // 8-connected neighbours
                (y - 1..=y + 1).any(|ny| {
                    (x - 1..=x + 1).any(|nx| (nx, ny) != (x, y) && suppressed[[ny, nx]] > high)
                })
            };
            if edge {
                mask[y * width + x] = 255;
            }
        }
    }

    Ok(mask)
}

/// Run all four stages and return the single-channel edge mask.
///
/// A zero-gradient image yields an all-background mask.
pub fn canny_edge_mask(
    src: &[u8],
    width: usize,
    height: usize,
    config: &CannyConfig,
) -> Result<Vec<u8>> {
    config.validate()?;
    check_len(src.len(), width, height, 4)?;

    let smoothed = smooth_gray(src, width, height, config.gaussian_radius)?;
    let field = GradientField::compute(&smoothed, width, height)?;
    let suppressed = non_max_suppression(&field);

    match hysteresis_threshold(&suppressed, config.low_ratio, config.high_ratio) {
        Ok(mask) => {
            debug!(
                "canny: {}x{} -> {} edge pixels",
                width,
                height,
                mask.iter().filter(|&&v| v == 255).count()
            );
            Ok(mask)
        }
        Err(FilterError::DegenerateInput(reason)) => {
            debug!("canny: {reason}, emitting empty edge map");
            Ok(vec![0u8; width * height])
        }
        Err(e) => Err(e),
    }
}

/// Canny edge map of an RGBA image, broadcast to opaque gray RGBA.
pub fn canny_edges_rgba(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    config: &CannyConfig,
) -> Result<()> {
    check_len(dst.len(), width, height, 4)?;
    let mask = canny_edge_mask(src, width, height, config)?;
    gray_to_rgba(&mask, dst, width, height)
}

/// Canny edge detection as a reusable filter.
///
/// # Errors
/// `InvalidParameter` unless `gaussian_radius > 0`, both ratios are in
/// [0, 0.5] and `low_ratio < high_ratio`.
pub fn canny_edges(gaussian_radius: f32, low_ratio: f32, high_ratio: f32) -> Result<FilterFn> {
    let config = CannyConfig::new(gaussian_radius, low_ratio, high_ratio)?;
    Ok(Box::new(move |src, dst, width, height| {
        canny_edges_rgba(src, dst, width, height, &config)
    }))
}
