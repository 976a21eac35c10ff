//! Sobel gradient estimation.
//!
//! [`GradientField`] holds the signed horizontal and vertical responses of a
//! gray buffer together with the derived magnitude and direction. The Sobel
//! filter renders the magnitude as an opaque gray RGBA image; the Canny
//! detector builds on the same field.

use log::debug;
use ndarray::Array2;

use super::blur::gaussian_blur_rgba;
use super::convolve::convolve_gray_f32;
use super::grayscale::{gray_to_rgba, to_gray};
use super::kernel::sobel_kernels;
use super::FilterFn;
use crate::error::{check_len, check_positive_radius, Result};

/// Gradient components of a gray image, all of shape `(height, width)`.
#[derive(Debug, Clone)]
pub struct GradientField {
    pub gx: Array2<f32>,
    pub gy: Array2<f32>,
    /// `sqrt(gx^2 + gy^2)`
    pub magnitude: Array2<f32>,
    /// `atan2(gy, gx)` in degrees, normalized to [0, 360)
    pub angle: Array2<f32>,
}

impl GradientField {
    /// Convolve a gray buffer with the Sobel pair and derive magnitude and angle.
    ///
    /// # Arguments
    /// * `gray` - Single-channel bytes, length `width * height`
    pub fn compute(gray: &[u8], width: usize, height: usize) -> Result<Self> {
        let (sobel_x, sobel_y) = sobel_kernels();
        let gx = convolve_gray_f32(&sobel_x, gray, width, height)?;
        let gy = convolve_gray_f32(&sobel_y, gray, width, height)?;

        let magnitude = ndarray::Zip::from(&gx)
            .and(&gy)
            .map_collect(|&x, &y| (x * x + y * y).sqrt());
        let angle = ndarray::Zip::from(&gx)
            .and(&gy)
            .map_collect(|&x, &y| normalize_degrees(y.atan2(x).to_degrees()));

        Ok(Self {
            gx,
            gy,
            magnitude,
            angle,
        })
    }

    pub fn width(&self) -> usize {
        self.gx.ncols()
    }

    pub fn height(&self) -> usize {
        self.gx.nrows()
    }

    /// Largest gradient magnitude in the field (0 for an empty field).
    pub fn max_magnitude(&self) -> f32 {
        self.magnitude.iter().copied().fold(0.0, f32::max)
    }
}

/// Map an angle in degrees to [0, 360).
#[inline]
pub(crate) fn normalize_degrees(a: f32) -> f32 {
    let a = a.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Sobel gradient magnitude of an RGBA image.
///
/// Pipeline: Gaussian blur of the RGBA source, gray conversion, Sobel X/Y,
/// magnitude rounded and clamped to 0-255, broadcast back to opaque RGBA.
///
/// # Errors
/// `InvalidParameter` for a radius that is not > 0, `BufferSizeMismatch` for bad buffers.
pub fn sobel_edges_rgba(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    gaussian_radius: f32,
) -> Result<()> {
    check_positive_radius(gaussian_radius)?;
    check_len(src.len(), width, height, 4)?;
    check_len(dst.len(), width, height, 4)?;

    let mut blurred = vec![0u8; src.len()];
    gaussian_blur_rgba(src, &mut blurred, width, height, gaussian_radius)?;
    let gray = to_gray(&blurred, width, height)?;

    let field = GradientField::compute(&gray, width, height)?;
    let edges: Vec<u8> = field
        .magnitude
        .iter()
        .map(|&m| (m + 0.5).floor().clamp(0.0, 255.0) as u8)
        .collect();

    debug!(
        "sobel_edges: {}x{} radius {} max magnitude {:.1}",
        width,
        height,
        gaussian_radius,
        field.max_magnitude()
    );

    gray_to_rgba(&edges, dst, width, height)
}

/// Sobel edge magnitude as a reusable filter.
pub fn sobel_edges(gaussian_radius: f32) -> Result<FilterFn> {
    check_positive_radius(gaussian_radius)?;
    Ok(Box::new(move |src, dst, width, height| {
        sobel_edges_rgba(src, dst, width, height, gaussian_radius)
    }))
}
