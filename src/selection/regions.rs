//! Color-threshold region detection.
//!
//! Pipeline:
//! 1. Threshold RGBA pixels into a binary mask by per-channel ranges
//! 2. Label 4-connected foreground components with a work-list flood fill
//! 3. Drop clusters that are too small or too far from square
//! 4. Optionally score survivors against a [`TemplateMask`]
//!
//! Regions come out in discovery order (raster scan of each cluster's seed).

use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::template::TemplateMask;
use crate::error::{check_len, FilterError, Result};

/// Inclusive range of accepted values for one color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub min: u8,
    pub max: u8,
}

impl ChannelRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, v: u8) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Region detection parameters.
///
/// Defaults select saturated red, roughly square regions of at least 5x5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
    /// Minimum bounding-box width (`x2 - x1`)
    pub min_width: usize,
    /// Minimum bounding-box height (`y2 - y1`)
    pub min_height: usize,
    /// Minimum `min(w, h) / max(w, h)`, in [0, 1]
    pub min_aspect_ratio: f32,
    /// Largest accepted template distance, in [0, 1]
    pub max_template_distance: f32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            red: ChannelRange::new(80, 255),
            green: ChannelRange::new(0, 80),
            blue: ChannelRange::new(0, 80),
            min_width: 5,
            min_height: 5,
            min_aspect_ratio: 0.8,
            max_template_distance: 0.6,
        }
    }
}

impl RegionConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [("red", self.red), ("green", self.green), ("blue", self.blue)] {
            if range.min > range.max {
                return Err(FilterError::InvalidParameter(format!(
                    "{name} range is empty: {}..={}",
                    range.min, range.max
                )));
            }
        }
        for (name, value) in [
            ("min_aspect_ratio", self.min_aspect_ratio),
            ("max_template_distance", self.max_template_distance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FilterError::InvalidParameter(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    #[inline]
    fn matches(&self, r: u8, g: u8, b: u8) -> bool {
        self.red.contains(r) && self.green.contains(g) && self.blue.contains(b)
    }
}

/// Bounding box handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// A connected group of foreground pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Label >= 1; 0 marks unlabeled pixels
    pub id: u32,
    /// Member pixel indices (`y * width + x`)
    pub pixels: Vec<usize>,
    /// Inclusive bounding box
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
    /// `1 - template distance`, set only when scored against a template
    pub similarity_score: Option<f32>,
}

impl Cluster {
    fn seed(id: u32, x: usize, y: usize) -> Self {
        Self {
            id,
            pixels: Vec::new(),
            x1: x,
            y1: y,
            x2: x,
            y2: y,
            similarity_score: None,
        }
    }

    fn add(&mut self, index: usize, x: usize, y: usize) {
        self.pixels.push(index);
        self.x1 = self.x1.min(x);
        self.y1 = self.y1.min(y);
        self.x2 = self.x2.max(x);
        self.y2 = self.y2.max(y);
    }

    /// `x2 - x1`; a single-pixel cluster has width 0.
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    /// `min(w, h) / max(w, h)`, 1.0 for a degenerate 0x0 box.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = (self.width(), self.height());
        let longest = w.max(h);
        if longest == 0 {
            1.0
        } else {
            w.min(h) as f32 / longest as f32
        }
    }

    pub fn region(&self) -> Region {
        Region {
            x: self.x1,
            y: self.y1,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Per-pixel labels and the clusters they refer to.
#[derive(Debug, Clone)]
pub struct LabelMap {
    pub width: usize,
    pub height: usize,
    /// Cluster id per pixel, 0 for background
    pub labels: Vec<u32>,
    /// Clusters in discovery order; `clusters[i].id == i + 1`
    pub clusters: Vec<Cluster>,
}

impl LabelMap {
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    pub fn cluster(&self, id: u32) -> Option<&Cluster> {
        if id == 0 {
            return None;
        }
        self.clusters.get(id as usize - 1)
    }
}

/// Classify RGBA pixels into a binary mask (255 inside all three ranges, else 0).
pub fn color_threshold(
    src: &[u8],
    width: usize,
    height: usize,
    config: &RegionConfig,
) -> Result<Vec<u8>> {
    check_len(src.len(), width, height, 4)?;

    Ok(src
        .chunks_exact(4)
        .map(|px| if config.matches(px[0], px[1], px[2]) { 255 } else { 0 })
        .collect())
}

/// Label 4-connected components of a binary mask.
///
/// Any non-zero mask value counts as foreground. Each unlabeled foreground
/// pixel met in raster order seeds a new cluster, which is grown with an
/// explicit stack so large regions cannot overflow the call stack.
pub fn label_clusters(mask: &[u8], width: usize, height: usize) -> Result<LabelMap> {
    check_len(mask.len(), width, height, 1)?;

    let mut labels = vec![0u32; width * height];
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let seed = y * width + x;
            if mask[seed] == 0 || labels[seed] != 0 {
                continue;
            }

            let id = clusters.len() as u32 + 1;
            let mut cluster = Cluster::seed(id, x, y);
            labels[seed] = id;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                cluster.add(cy * width + cx, cx, cy);

                // Horizontal and vertical neighbours only
                let neighbours = [
                    (cx.wrapping_sub(1), cy),
                    (cx + 1, cy),
                    (cx, cy.wrapping_sub(1)),
                    (cx, cy + 1),
                ];
                for (nx, ny) in neighbours {
                    if nx >= width || ny >= height {
                        continue;
                    }
                    let nidx = ny * width + nx;
                    if mask[nidx] != 0 && labels[nidx] == 0 {
                        labels[nidx] = id;
                        stack.push((nx, ny));
                    }
                }
            }

            clusters.push(cluster);
        }
    }

    debug!("label_clusters: {}x{} -> {} clusters", width, height, clusters.len());

    Ok(LabelMap {
        width,
        height,
        labels,
        clusters,
    })
}

/// Size and squareness check applied before template scoring.
pub fn passes_shape_filter(cluster: &Cluster, config: &RegionConfig) -> bool {
    cluster.width() >= config.min_width
        && cluster.height() >= config.min_height
        && cluster.aspect_ratio() >= config.min_aspect_ratio
}

/// Render a label map as RGBA: one color per cluster, opaque black background.
pub fn paint_clusters(map: &LabelMap) -> Vec<u8> {
    let mut out = vec![0u8; map.labels.len() * 4];
    for (px, &id) in out.chunks_exact_mut(4).zip(map.labels.iter()) {
        if id != 0 {
            px[0] = (id.wrapping_mul(67) % 200 + 55) as u8;
            px[1] = (id.wrapping_mul(131) % 200 + 55) as u8;
            px[2] = (id.wrapping_mul(29) % 200 + 55) as u8;
        }
        px[3] = 255;
    }
    out
}

/// Region detector with a validated configuration and an optional template.
#[derive(Debug, Clone, Default)]
pub struct RegionDetector {
    config: RegionConfig,
    template: Option<Arc<TemplateMask>>,
}

impl RegionDetector {
    pub fn new(config: RegionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            template: None,
        })
    }

    /// Score shape-filtered clusters against `template` before accepting them.
    pub fn with_template(mut self, template: Arc<TemplateMask>) -> Self {
        self.template = Some(template);
        self
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Accepted clusters, scored when a template is set, in discovery order.
    pub fn clusters(&self, src: &[u8], width: usize, height: usize) -> Result<Vec<Cluster>> {
        let mask = color_threshold(src, width, height, &self.config)?;
        let map = label_clusters(&mask, width, height)?;
        let found = map.clusters.len();

        let mut accepted: Vec<Cluster> = map
            .clusters
            .into_iter()
            .filter(|c| passes_shape_filter(c, &self.config))
            .collect();
        let shaped = accepted.len();

        if let Some(template) = &self.template {
            accepted.retain_mut(|cluster| match template.distance(src, width, cluster) {
                Some(distance) => {
                    cluster.similarity_score = Some(1.0 - distance);
                    trace!(
                        "cluster {} at ({}, {}) {}x{}: template distance {:.3}",
                        cluster.id,
                        cluster.x1,
                        cluster.y1,
                        cluster.width(),
                        cluster.height(),
                        distance
                    );
                    distance <= self.config.max_template_distance
                }
                None => {
                    trace!("cluster {}: template fully transparent over box", cluster.id);
                    false
                }
            });
        }

        debug!(
            "regions: {} clusters, {} pass shape filter, {} accepted",
            found,
            shaped,
            accepted.len()
        );

        Ok(accepted)
    }

    pub fn detect(&self, src: &[u8], width: usize, height: usize) -> Result<Vec<Region>> {
        Ok(self
            .clusters(src, width, height)?
            .iter()
            .map(Cluster::region)
            .collect())
    }
}

/// Detect regions with the default configuration and no template.
pub fn detect_regions(src: &[u8], width: usize, height: usize) -> Result<Vec<Region>> {
    RegionDetector::default().detect(src, width, height)
}
