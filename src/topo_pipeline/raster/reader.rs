use std::path::Path;

use crate::topo_pipeline::common::error::Result;
use crate::topo_pipeline::raster::types::RasterInfo;

/// An open, read-only raster.
pub trait RasterReader {
    fn info(&self) -> &RasterInfo;

    /// Reads one full-width scan line of `band` (0-based) at `row` into `out`.
    fn read_row(&mut self, band: usize, row: usize, out: &mut [f64]) -> Result<()>;
}

/// Opens rasters by path.
pub trait RasterSource {
    type Reader: RasterReader;

    fn open(&self, path: &Path) -> Result<Self::Reader>;
}
