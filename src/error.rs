//! Error type shared by every filter and detector.

use thiserror::Error;

use crate::filters::kernel::MAX_RADIUS;

/// Precondition failures reported by the filters.
///
/// All variants are raised before a destination buffer is written, so a
/// failed call never leaves partial output behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// Check that `buf` holds exactly `width * height * channels` samples.
pub(crate) fn check_len(
    buf_len: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<()> {
    let expected = width * height * channels;
    if buf_len != expected {
        return Err(FilterError::BufferSizeMismatch {
            expected,
            actual: buf_len,
        });
    }
    Ok(())
}

/// Validate a blur/kernel radius: finite, not negative and at most [`MAX_RADIUS`].
pub(crate) fn check_radius(radius: f32) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(FilterError::InvalidParameter(format!(
            "radius must be a finite value >= 0, got {radius}"
        )));
    }
    if radius > MAX_RADIUS {
        return Err(FilterError::InvalidParameter(format!(
            "radius must be at most {MAX_RADIUS}, got {radius}"
        )));
    }
    Ok(())
}

/// Validate a radius that has to be strictly positive (Gaussian-based filters).
pub(crate) fn check_positive_radius(radius: f32) -> Result<()> {
    check_radius(radius)?;
    if radius == 0.0 {
        return Err(FilterError::InvalidParameter(
            "radius must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
