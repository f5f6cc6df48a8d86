//! DEM to topo map pipeline
//!
//! This module turns externally generated terrain rasters (color relief, hillshade,
//! slope) into a shaded topographic image. The heart of it is the HSV merge, which
//! keeps the hue and saturation of a color raster and takes brightness from an
//! intensity raster, streaming both one scan line at a time.

pub mod common;
pub mod hsv;
pub mod raster;
pub mod merge;
pub mod shading;
pub mod batch;

pub use common::{
    TopoError,
    Result,
};

pub use hsv::{
    HsvRow,
    rgb_to_hsv,
    rgb_to_hsv_into,
    rgb_to_hsv_pixel,
    hsv_to_rgb_into,
    hsv_to_rgb_pixel,
};

pub use raster::{
    GeoKeys,
    GeoTransform,
    RasterInfo,
    SampleType,
    RasterReader,
    RasterSource,
    RasterWriter,
    RowSink,
    GeoTiffReader,
    GeoTiffSource,
    GeoTiffWriter,
    MemoryRaster,
    MemorySource,
    MemoryWriter,
};

pub use merge::{
    MergeConfig,
    MergeConfigBuilder,
    TiffCompression,
    HsvMergePipeline,
    hsv_merge,
};

pub use shading::{
    ShadeBlend,
    WaterBurn,
    blend_slope_hillshade,
    slope_water_mask,
    burn_water,
};

pub use batch::{
    BatchConfig,
    BatchConfigBuilder,
    BatchReport,
    DemFailure,
    TopoOutput,
    Product,
    discover_dems,
    product_path,
    DemProcessor,
    GdalDemProcessor,
    TopoBatch,
    PipelineTimings,
    StepTiming,
    Timer,
};
