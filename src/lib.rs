//! StagVision
//!
//! Convolution filters, edge detection and color region extraction over
//! flat 8-bit buffers, with optional Python bindings via PyO3 and WASM
//! bindings for JavaScript.
//!
//! ## Image Format
//! - **RGBA**: `width * height * 4` bytes, row-major
//! - **Gray**: `width * height` bytes, row-major
//!
//! Filters write into a caller-provided destination of the same size and
//! never keep references past the call.

pub mod error;
pub mod filters;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FilterError, Result};
pub use filters::blur::{box_blur, gaussian_blur};
pub use filters::canny::{canny_edges, CannyConfig};
pub use filters::convolve::convolve;
pub use filters::edge::sobel_edges;
pub use filters::kernel::Kernel;
pub use filters::FilterFn;
pub use selection::{detect_regions, Region, RegionConfig, RegionDetector, TemplateMask};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use std::sync::Arc;

    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters::FilterFn;
    use crate::filters::{blur, canny, edge};
    use crate::selection::regions::{RegionConfig, RegionDetector};
    use crate::selection::template::TemplateMask;

    fn to_py_err(e: FilterError) -> PyErr {
        PyValueError::new_err(e.to_string())
    }

    /// Run an RGBA filter over a `(height, width, 4)` u8 array.
    fn apply<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter: FilterFn,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let input = image.as_array();
        let (height, width, channels) = input.dim();
        if channels != 4 {
            return Err(PyValueError::new_err(format!(
                "expected RGBA image, got {channels} channels"
            )));
        }
        let src: Vec<u8> = input.iter().copied().collect();
        let mut dst = vec![0u8; src.len()];
        filter(&src, &mut dst, width, height).map_err(to_py_err)?;

        let result = ndarray::Array3::from_shape_vec((height, width, 4), dst)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Box blur of an RGBA u8 image.
    #[pyfunction]
    #[pyo3(signature = (image, radius=1.0))]
    pub fn box_blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, blur::box_blur(radius).map_err(to_py_err)?)
    }

    /// Gaussian blur of an RGBA u8 image (sigma = radius / 3).
    #[pyfunction]
    #[pyo3(signature = (image, radius=2.0))]
    pub fn gaussian_blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        radius: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, blur::gaussian_blur(radius).map_err(to_py_err)?)
    }

    /// Sobel gradient magnitude as an opaque gray RGBA image.
    #[pyfunction]
    #[pyo3(signature = (image, gaussian_radius=2.0))]
    pub fn sobel_edges<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        gaussian_radius: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, edge::sobel_edges(gaussian_radius).map_err(to_py_err)?)
    }

    /// Canny edge map: white edges on black, alpha 255.
    ///
    /// # Arguments
    /// * `image` - RGBA u8 image
    /// * `gaussian_radius` - Smoothing radius (> 0)
    /// * `low_ratio` - Weak threshold as a fraction of the max magnitude
    /// * `high_ratio` - Strong threshold as a fraction of the max magnitude
    #[pyfunction]
    #[pyo3(signature = (
        image,
        gaussian_radius=canny::DEFAULT_GAUSSIAN_RADIUS,
        low_ratio=canny::DEFAULT_LOW_RATIO,
        high_ratio=canny::DEFAULT_HIGH_RATIO
    ))]
    pub fn canny_edges<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        gaussian_radius: f32,
        low_ratio: f32,
        high_ratio: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let filter = canny::canny_edges(gaussian_radius, low_ratio, high_ratio).map_err(to_py_err)?;
        apply(py, image, filter)
    }

    // ========================================================================
    // Regions
    // ========================================================================

    /// Detect red, roughly square regions.
    ///
    /// # Arguments
    /// * `image` - RGBA u8 image
    /// * `template` - Optional RGBA u8 reference image for similarity scoring
    ///
    /// # Returns
    /// List of `(x, y, width, height)` tuples in discovery order
    #[pyfunction]
    #[pyo3(signature = (image, template=None, max_template_distance=0.6))]
    pub fn detect_regions<'py>(
        image: PyReadonlyArray3<'py, u8>,
        template: Option<PyReadonlyArray3<'py, u8>>,
        max_template_distance: f32,
    ) -> PyResult<Vec<(usize, usize, usize, usize)>> {
        let input = image.as_array();
        let (height, width, channels) = input.dim();
        if channels != 4 {
            return Err(PyValueError::new_err(format!(
                "expected RGBA image, got {channels} channels"
            )));
        }
        let src: Vec<u8> = input.iter().copied().collect();

        let config = RegionConfig {
            max_template_distance,
            ..RegionConfig::default()
        };
        let mut detector = RegionDetector::new(config).map_err(to_py_err)?;
        if let Some(template) = template {
            let mask = TemplateMask::from_array(template.as_array().to_owned()).map_err(to_py_err)?;
            detector = detector.with_template(Arc::new(mask));
        }

        let regions = detector.detect(&src, width, height).map_err(to_py_err)?;
        Ok(regions
            .into_iter()
            .map(|r| (r.x, r.y, r.width, r.height))
            .collect())
    }

    /// Python module definition
    #[pymodule]
    pub fn stag_vision(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Filters
        m.add_function(wrap_pyfunction!(box_blur, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian_blur, m)?)?;
        m.add_function(wrap_pyfunction!(sobel_edges, m)?)?;
        m.add_function(wrap_pyfunction!(canny_edges, m)?)?;

        // Regions
        m.add_function(wrap_pyfunction!(detect_regions, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::stag_vision;
