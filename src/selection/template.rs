//! Reference template used to score candidate regions.
//!
//! The template is an RGBA image loaded once by the caller and shared as an
//! immutable `Arc<TemplateMask>`. Its alpha channel weights the comparison,
//! so transparent template pixels do not count.

use ndarray::{Array3, ArrayView3};

use super::regions::Cluster;
use crate::error::{check_len, FilterError, Result};

/// Immutable RGBA reference image of shape `(height, width, 4)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMask {
    image: Array3<u8>,
}

impl TemplateMask {
    /// Wrap a flat RGBA buffer.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty image, `BufferSizeMismatch` for a wrong length.
    pub fn from_rgba(data: &[u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidParameter(format!(
                "template must not be empty, got {width}x{height}"
            )));
        }
        check_len(data.len(), width, height, 4)?;
        let image = Array3::from_shape_vec((height, width, 4), data.to_vec())
            .map_err(|e| FilterError::InvalidParameter(e.to_string()))?;
        Ok(Self { image })
    }

    /// Wrap an existing `(height, width, 4)` array.
    pub fn from_array(image: Array3<u8>) -> Result<Self> {
        let (height, width, channels) = image.dim();
        if width == 0 || height == 0 || channels != 4 {
            return Err(FilterError::InvalidParameter(format!(
                "template must be a non-empty RGBA image, got {height}x{width}x{channels}"
            )));
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> usize {
        self.image.dim().1
    }

    pub fn height(&self) -> usize {
        self.image.dim().0
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.image.view()
    }

    /// Nearest-neighbour resample to `width x height`.
    pub fn resample(&self, width: usize, height: usize) -> Array3<u8> {
        let (src_h, src_w, _) = self.image.dim();
        let mut out = Array3::<u8>::zeros((height, width, 4));

        for y in 0..height {
            let sy = (((y as f32 + 0.5) * src_h as f32 / height as f32) as usize).min(src_h - 1);
            for x in 0..width {
                let sx = (((x as f32 + 0.5) * src_w as f32 / width as f32) as usize).min(src_w - 1);
                for c in 0..4 {
                    out[[y, x, c]] = self.image[[sy, sx, c]];
                }
            }
        }

        out
    }

    /// Alpha-weighted mean color distance between a cluster and the template.
    ///
    /// The template is resampled to the cluster's `width x height` and laid
    /// over the half-open box `[x1, x2) x [y1, y2)` of `src`. Each pixel
    /// contributes its squared RGB distance, normalized to [0, 1] by
    /// `3 * 255^2` and weighted by template alpha.
    ///
    /// # Returns
    /// Mean distance in [0, 1] (0 = identical), or `None` when the box is
    /// empty or the overlaid template is fully transparent.
    pub fn distance(&self, src: &[u8], src_width: usize, cluster: &Cluster) -> Option<f32> {
        let (width, height) = (cluster.width(), cluster.height());
        if width == 0 || height == 0 {
            return None;
        }
        let mask = self.resample(width, height);

        let mut total_dist = 0.0f32;
        let mut total_weight = 0.0f32;
        for cy in cluster.y1..cluster.y2 {
            for cx in cluster.x1..cluster.x2 {
                let i = (cy * src_width + cx) * 4;
                let (mx, my) = (cx - cluster.x1, cy - cluster.y1);

                let weight = mask[[my, mx, 3]] as f32 / 255.0;
                let mut dist = 0.0f32;
                for c in 0..3 {
                    let d = mask[[my, mx, c]] as f32 - src[i + c] as f32;
                    dist += d * d;
                }
                total_dist += dist / (255.0 * 255.0 * 3.0) * weight;
                total_weight += weight;
            }
        }

        if total_weight > 0.0 {
            Some(total_dist / total_weight)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(x1: usize, y1: usize, x2: usize, y2: usize) -> Cluster {
        Cluster {
            id: 1,
            pixels: Vec::new(),
            x1,
            y1,
            x2,
            y2,
            similarity_score: None,
        }
    }

    fn solid(width: usize, height: usize, px: [u8; 4]) -> Vec<u8> {
        px.repeat(width * height)
    }

    #[test]
    fn test_from_rgba_validates() {
        assert!(TemplateMask::from_rgba(&[0u8; 16], 2, 2).is_ok());
        assert!(TemplateMask::from_rgba(&[0u8; 15], 2, 2).is_err());
        assert!(TemplateMask::from_rgba(&[], 0, 0).is_err());
        assert!(TemplateMask::from_array(Array3::zeros((2, 2, 3))).is_err());
    }

    #[test]
    fn test_resample_nearest() {
        // 2x1 template: red | blue
        let data = [255u8, 0, 0, 255, 0, 0, 255, 255];
        let template = TemplateMask::from_rgba(&data, 2, 1).unwrap();
        assert_eq!((template.width(), template.height()), (2, 1));

        let up = template.resample(4, 2);
        assert_eq!(up.dim(), (2, 4, 4));
        assert_eq!(up[[0, 0, 0]], 255);
        assert_eq!(up[[0, 1, 0]], 255);
        assert_eq!(up[[1, 2, 2]], 255);
        assert_eq!(up[[1, 3, 0]], 0);
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let template = TemplateMask::from_rgba(&solid(3, 3, [200, 10, 10, 255]), 3, 3).unwrap();
        let src = solid(8, 8, [200, 10, 10, 255]);
        let d = template.distance(&src, 8, &cluster(1, 1, 6, 6)).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_distance_opposite_is_one() {
        let template = TemplateMask::from_rgba(&solid(2, 2, [255, 255, 255, 255]), 2, 2).unwrap();
        let src = solid(8, 8, [0, 0, 0, 255]);
        let d = template.distance(&src, 8, &cluster(0, 0, 5, 5)).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_transparent_template() {
        let template = TemplateMask::from_rgba(&solid(2, 2, [255, 0, 0, 0]), 2, 2).unwrap();
        let src = solid(8, 8, [255, 0, 0, 255]);
        assert_eq!(template.distance(&src, 8, &cluster(0, 0, 5, 5)), None);
        assert_eq!(template.distance(&src, 8, &cluster(2, 2, 2, 6)), None);
    }
}
