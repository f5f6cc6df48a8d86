//! Batch DEM to topo conversion
//!
//! Runs every DEM in a folder through the full chain: external color relief,
//! hillshade and slope, the slope/hillshade blend, the HSV merge and the water burn.
//! Intermediate rasters are removed once a DEM is finished, whether or not it
//! succeeded.

mod types;
mod naming;
mod dem_processor;
mod cleanup;
mod pipeline;
pub mod timing;


pub use types::{BatchConfig, BatchConfigBuilder, BatchReport, DemFailure, TopoOutput};
pub use naming::{Product, discover_dems, product_path};
pub use dem_processor::{DemProcessor, GdalDemProcessor};
pub use pipeline::TopoBatch;
pub use timing::{PipelineTimings, StepTiming, Timer};
