//! Filter modules for RGBA and gray buffers.
//!
//! ## Buffer Formats
//!
//! | Format | Length | Channel order |
//! |--------|--------|---------------|
//! | RGBA8 | width * height * 4 | R, G, B, A |
//! | Gray8 | width * height | luminance |
//! | Gradient | (height, width) `Array2<f32>` | signed response |
//!
//! Every filter validates buffer lengths before writing, so the destination
//! is untouched when a call fails.
//!
//! ## Filter Categories
//!
//! - **Kernels**: box, Gaussian (1D pair and 2D), Sobel
//! - **Convolution**: horizontal, vertical and full 2D passes, clamp-to-edge
//! - **Blur**: box, Gaussian
//! - **Edge detection**: Sobel magnitude, Canny

pub mod kernel;
pub mod grayscale;
pub mod convolve;
pub mod blur;
pub mod edge;
pub mod canny;

use crate::error::Result;

/// A filter from an RGBA source to an RGBA destination of the same size.
///
/// Arguments are `(src, dst, width, height)`.
pub type FilterFn = Box<dyn Fn(&[u8], &mut [u8], usize, usize) -> Result<()> + Send + Sync>;
