//! WebAssembly exports for StagVision filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Every export
//! takes a flat RGBA byte array plus its dimensions and returns a new flat
//! RGBA array; parameter and size errors surface as JavaScript exceptions.

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::error::FilterError;
use crate::filters::FilterFn;
use crate::filters::{blur, canny, edge};
use crate::selection::regions::{RegionConfig, RegionDetector};
use crate::selection::template::TemplateMask;

fn to_js(e: FilterError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn apply(filter: FilterFn, data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let mut out = vec![0u8; data.len()];
    filter(data, &mut out, width, height).map_err(to_js)?;
    Ok(out)
}

// ============================================================================
// Filters
// ============================================================================

/// Box blur.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `radius` - Blur radius, rounded up to whole pixels
#[wasm_bindgen]
pub fn box_blur_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<Vec<u8>, JsValue> {
    apply(blur::box_blur(radius).map_err(to_js)?, data, width, height)
}

/// Gaussian blur (sigma = radius / 3).
#[wasm_bindgen]
pub fn gaussian_blur_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<Vec<u8>, JsValue> {
    apply(blur::gaussian_blur(radius).map_err(to_js)?, data, width, height)
}

/// Sobel gradient magnitude as an opaque gray image.
#[wasm_bindgen]
pub fn sobel_edges_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    gaussian_radius: f32,
) -> Result<Vec<u8>, JsValue> {
    apply(edge::sobel_edges(gaussian_radius).map_err(to_js)?, data, width, height)
}

/// Canny edge map.
///
/// # Arguments
/// * `low_ratio` / `high_ratio` - Thresholds as fractions of the max gradient, in [0, 0.5]
#[wasm_bindgen]
pub fn canny_edges_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    gaussian_radius: f32,
    low_ratio: f32,
    high_ratio: f32,
) -> Result<Vec<u8>, JsValue> {
    let filter = canny::canny_edges(gaussian_radius, low_ratio, high_ratio).map_err(to_js)?;
    apply(filter, data, width, height)
}

// ============================================================================
// Regions
// ============================================================================

/// Detect red, roughly square regions.
///
/// An empty `template` skips similarity scoring.
///
/// # Returns
/// Flat `[x, y, width, height, ...]` array, four entries per region
#[wasm_bindgen]
pub fn detect_regions_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    template: &[u8],
    template_width: usize,
    template_height: usize,
) -> Result<Vec<u32>, JsValue> {
    let mut detector = RegionDetector::new(RegionConfig::default()).map_err(to_js)?;
    if !template.is_empty() {
        let mask = TemplateMask::from_rgba(template, template_width, template_height)
            .map_err(to_js)?;
        detector = detector.with_template(Arc::new(mask));
    }

    let regions = detector.detect(data, width, height).map_err(to_js)?;
    Ok(regions
        .iter()
        .flat_map(|r| [r.x as u32, r.y as u32, r.width as u32, r.height as u32])
        .collect())
}
