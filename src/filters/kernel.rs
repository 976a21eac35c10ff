//! Convolution kernel construction.
//!
//! Builds the weight matrices used by the convolution engine:
//! - Box (uniform average)
//! - Gaussian, as a pair of 1D vectors for separable blurs or as a full 2D matrix
//! - Sobel 3x3 gradient pair
//!
//! All builders are pure functions of their numeric parameters.

use ndarray::{Array2, ArrayView2};

use crate::error::{check_radius, FilterError, Result};

/// Traversal mode implied by a kernel's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    /// 1 x N, scans the x-axis only. A 1x1 kernel also lands here.
    Horizontal,
    /// N x 1, scans the y-axis only.
    Vertical,
    /// General M x N.
    Full,
}

/// Immutable convolution weight matrix with odd width and height.
///
/// Weights are stored row-major with shape `(height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    matrix: Array2<f32>,
}

impl Kernel {
    /// Build a kernel from row-major weights.
    ///
    /// # Errors
    /// `InvalidParameter` if a dimension is even or zero, or if
    /// `weights.len() != width * height`.
    pub fn new(width: usize, height: usize, weights: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 == 0 || height % 2 == 0 {
            return Err(FilterError::InvalidParameter(format!(
                "kernel dimensions must be odd and >= 1, got {width}x{height}"
            )));
        }
        if weights.len() != width * height {
            return Err(FilterError::InvalidParameter(format!(
                "kernel of {width}x{height} needs {} weights, got {}",
                width * height,
                weights.len()
            )));
        }
        let matrix = Array2::from_shape_vec((height, width), weights)
            .map_err(|e| FilterError::InvalidParameter(e.to_string()))?;
        Ok(Self { matrix })
    }

    /// Build a kernel from an existing `(height, width)` matrix.
    pub fn from_array(matrix: Array2<f32>) -> Result<Self> {
        let (height, width) = matrix.dim();
        Self::new(width, height, matrix.iter().copied().collect())
    }

    /// Single weight of 1.0; convolving with it copies the source.
    pub fn identity() -> Self {
        Self {
            matrix: Array2::from_elem((1, 1), 1.0),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.matrix.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.matrix.view()
    }

    /// Weights in row-major order.
    pub fn weights(&self) -> impl Iterator<Item = f32> + '_ {
        self.matrix.iter().copied()
    }

    pub fn sum(&self) -> f32 {
        self.matrix.sum()
    }

    pub fn shape(&self) -> KernelShape {
        if self.height() == 1 {
            KernelShape::Horizontal
        } else if self.width() == 1 {
            KernelShape::Vertical
        } else {
            KernelShape::Full
        }
    }

    /// Transposed copy: a row vector becomes a column vector and vice versa.
    pub fn transposed(&self) -> Self {
        Self {
            matrix: self.matrix.t().to_owned(),
        }
    }
}

/// Largest accepted blur or kernel radius, in pixels.
pub const MAX_RADIUS: f32 = 1024.0;

/// Round a validated radius up to the integer kernel radius.
#[inline]
pub(crate) fn integer_radius(radius: f32) -> Result<usize> {
    check_radius(radius)?;
    Ok(radius.ceil() as usize)
}

/// Side length `2r + 1` of a kernel with integer radius `r`.
fn kernel_size(r: usize) -> Result<usize> {
    r.checked_mul(2)
        .and_then(|d| d.checked_add(1))
        .ok_or_else(|| FilterError::InvalidParameter(format!("kernel radius {r} is too large")))
}

/// Build a square box (mean) kernel.
///
/// # Arguments
/// * `radius` - Rounded up to an integer `r`; the kernel is `(2r+1)^2`
///
/// # Returns
/// Kernel with every weight equal to `1 / size^2`. Radius 0 gives the identity.
pub fn box_kernel(radius: f32) -> Result<Kernel> {
    let size = kernel_size(integer_radius(radius)?)?;
    let area = size.checked_mul(size).ok_or_else(|| {
        FilterError::InvalidParameter(format!("box kernel {size}x{size} is too large"))
    })?;
    let weight = 1.0 / area as f32;
    Kernel::new(size, size, vec![weight; area])
}

/// Generate the normalized 1D Gaussian weights for a blur radius.
///
/// `sigma = radius / 3`. Samples whose squared offset exceeds `radius^2`
/// are zeroed, then the vector is renormalized to sum to 1.
///
/// Radius 0, and radii so small that `2 * sigma^2` underflows, give the
/// identity vector `[1.0]`.
pub fn gaussian_vector(radius: f32) -> Result<Vec<f32>> {
    let r = integer_radius(radius)?;
    kernel_size(r)?;
    let sigma = radius / 3.0;
    let sigma22 = 2.0 * sigma * sigma;
    if !sigma22.is_normal() {
        return Ok(vec![1.0]);
    }

    let r = isize::try_from(r)
        .map_err(|_| FilterError::InvalidParameter(format!("kernel radius {r} is too large")))?;
    let radius2 = radius * radius;

    let mut vector: Vec<f32> = (-r..=r)
        .map(|offset| {
            let distance = (offset * offset) as f32;
            if distance > radius2 {
                0.0
            } else {
                (-distance / sigma22).exp()
            }
        })
        .collect();

    // Normalize
    let total: f32 = vector.iter().sum();
    if !total.is_normal() {
        return Ok(vec![1.0]);
    }
    for v in vector.iter_mut() {
        *v /= total;
    }

    Ok(vector)
}

/// Build the row (1 x N) and column (N x 1) kernels of a separable Gaussian blur.
///
/// Both kernels come from the same vector, so the two passes share one radius.
pub fn gaussian_kernels(radius: f32) -> Result<(Kernel, Kernel)> {
    let vector = gaussian_vector(radius)?;
    let size = vector.len();
    let row = Kernel::new(size, 1, vector.clone())?;
    let column = Kernel::new(1, size, vector)?;
    Ok((row, column))
}

/// Build the full 2D Gaussian kernel (outer product of the 1D vector).
pub fn gaussian_kernel_2d(radius: f32) -> Result<Kernel> {
    let vector = gaussian_vector(radius)?;
    let size = vector.len();

    let mut matrix = Array2::<f32>::zeros((size, size));
    for y in 0..size {
        for x in 0..size {
            matrix[[y, x]] = vector[y] * vector[x];
        }
    }

    Kernel::from_array(matrix)
}

/// Fixed 3x3 horizontal and vertical gradient kernels.
///
/// Weights are +/-1 and not normalized.
pub fn sobel_kernels() -> (Kernel, Kernel) {
    // [1, 0, -1] in every row
    let x = Array2::from_shape_fn((3, 3), |(_, col)| 1.0 - col as f32);
    // [1, 1, 1] / [0, 0, 0] / [-1, -1, -1]
    let y = Array2::from_shape_fn((3, 3), |(row, _)| 1.0 - row as f32);
    (Kernel { matrix: x }, Kernel { matrix: y })
}
