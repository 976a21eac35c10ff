//! Blur filters for RGBA and gray buffers.
//!
//! Gaussian blur runs as a separable 2-pass convolution; box blur uses the
//! full 2D box kernel. All channels, alpha included, are blurred alike.

use log::debug;

use super::convolve::{convolve, convolve_separable};
use super::kernel::{box_kernel, gaussian_kernels};
use super::FilterFn;
use crate::error::{check_positive_radius, check_radius, Result};

/// Apply Gaussian blur to an RGBA buffer.
///
/// # Arguments
/// * `src` - RGBA bytes (width * height * 4)
/// * `dst` - Destination RGBA bytes, same length
/// * `radius` - Blur radius; `sigma = radius / 3`, rounded up for the kernel size
///
/// # Errors
/// `InvalidParameter` for a radius that is not > 0, `BufferSizeMismatch` for bad buffers.
pub fn gaussian_blur_rgba(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<()> {
    check_positive_radius(radius)?;
    let (row, column) = gaussian_kernels(radius)?;
    convolve_separable(&row, &column, src, dst, width, height, 4)
}

/// Apply Gaussian blur to a single-channel buffer.
pub fn gaussian_blur_gray(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<()> {
    check_positive_radius(radius)?;
    let (row, column) = gaussian_kernels(radius)?;
    convolve_separable(&row, &column, src, dst, width, height, 1)
}

/// Apply box blur to an RGBA buffer.
///
/// Every output pixel is the mean of the `(2r+1)^2` neighbourhood, with
/// clamp-to-edge sampling. Radius 0 copies the input.
pub fn box_blur_rgba(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<()> {
    let kernel = box_kernel(radius)?;
    convolve(&kernel, src, dst, width, height)
}

/// Box blur as a reusable filter.
pub fn box_blur(radius: f32) -> Result<FilterFn> {
    check_radius(radius)?;
    debug!("box_blur: radius {radius}");
    Ok(Box::new(move |src, dst, width, height| {
        box_blur_rgba(src, dst, width, height, radius)
    }))
}

/// Gaussian blur as a reusable filter.
pub fn gaussian_blur(radius: f32) -> Result<FilterFn> {
    check_positive_radius(radius)?;
    debug!("gaussian_blur: radius {radius}");
    Ok(Box::new(move |src, dst, width, height| {
        gaussian_blur_rgba(src, dst, width, height, radius)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    fn checker_rgba(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![0u8; width * height * 4];
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                let idx = (y * width + x) * 4;
                img[idx] = v;
                img[idx + 1] = v;
                img[idx + 2] = v;
                img[idx + 3] = 255;
            }
        }
        img
    }

    #[test]
    fn test_box_blur_radius_zero_is_identity() {
        let src = checker_rgba(6, 4);
        let mut dst = vec![0u8; src.len()];
        let filter = box_blur(0.0).unwrap();
        filter(&src, &mut dst, 6, 4).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn test_box_blur_averages() {
        // 3x1 gray-ish row: 0, 90, 180 -> centre is mean of a 3x3 clamped window
        let src = [0u8, 0, 0, 255, 90, 90, 90, 255, 180, 180, 180, 255];
        let mut dst = [0u8; 12];
        box_blur_rgba(&src, &mut dst, 3, 1, 1.0).unwrap();
        assert_eq!(dst[4], 90);
        // Left pixel: clamped window 0,0,90 on each of 3 rows -> 30
        assert_eq!(dst[0], 30);
        assert_eq!(dst[3], 255);
    }

    #[test]
    fn test_gaussian_blur_smooths_checkerboard() {
        let src = checker_rgba(10, 10);
        let mut dst = vec![0u8; src.len()];
        gaussian_blur_rgba(&src, &mut dst, 10, 10, 3.0).unwrap();
        let idx = (5 * 10 + 5) * 4;
        assert!(dst[idx] > 60 && dst[idx] < 200, "got {}", dst[idx]);
        assert_eq!(dst[idx + 3], 255);
    }

    #[test]
    fn test_gaussian_blur_gray_constant() {
        let src = vec![42u8; 8 * 3];
        let mut dst = vec![0u8; src.len()];
        gaussian_blur_gray(&src, &mut dst, 8, 3, 2.0).unwrap();
        assert!(dst.iter().all(|&v| v == 42));
    }

    #[test]
    fn test_gaussian_blur_rejects_bad_radius() {
        assert!(matches!(gaussian_blur(0.0), Err(FilterError::InvalidParameter(_))));
        assert!(matches!(gaussian_blur(-2.0), Err(FilterError::InvalidParameter(_))));
        assert!(matches!(box_blur(-1.0), Err(FilterError::InvalidParameter(_))));
    }

    #[test]
    fn test_huge_radius_fails_at_construction() {
        assert!(matches!(box_blur(1e30), Err(FilterError::InvalidParameter(_))));
        assert!(matches!(gaussian_blur(1e30), Err(FilterError::InvalidParameter(_))));

        let src = vec![200u8; 4 * 4 * 4];
        let mut dst = vec![0u8; src.len()];
        assert!(box_blur_rgba(&src, &mut dst, 4, 4, 1e30).is_err());
        assert!(dst.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_tiny_radius_keeps_image() {
        let src = vec![200u8; 5 * 5 * 4];
        let mut dst = vec![0u8; src.len()];
        let filter = gaussian_blur(1e-30).unwrap();
        filter(&src, &mut dst, 5, 5).unwrap();
        assert_eq!(dst, src);
    }
}
