//! Region selection by color.
//!
//! - **Regions**: color threshold, 4-connected labeling and shape filtering
//! - **Template**: alpha-weighted similarity against a reference image

pub mod regions;
pub mod template;

pub use regions::{detect_regions, Cluster, LabelMap, Region, RegionConfig, RegionDetector};
pub use template::TemplateMask;
