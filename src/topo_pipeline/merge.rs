//! HSV merge module
//!
//! Composites an intensity raster (e.g. blended slope and hillshade) into a color
//! relief raster: hue and saturation come from the color raster, brightness from the
//! intensity raster except where the intensity raster has no data.

mod types;
mod pipeline;


pub use types::{MergeConfig, MergeConfigBuilder};
pub use crate::topo_pipeline::raster::TiffCompression;
pub use pipeline::{HsvMergePipeline, composite_value, hsv_merge};
