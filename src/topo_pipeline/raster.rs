//! Raster I/O module
//!
//! This module defines the raster capabilities the pipeline relies on (open, read a
//! scan line, create, write a scan line, finalize) and provides a GeoTIFF backend
//! built on the `tiff` crate plus an in-memory backend.

mod reader;
mod writer;
mod geotiff_reader;
mod geotiff_writer;
mod memory;
pub mod types;

#[cfg(test)]
mod tests;

pub use reader::{RasterReader, RasterSource};
pub use writer::{RasterWriter, RowSink};
pub(crate) use writer::{FromSample, InterleavedRowSink};
pub use geotiff_reader::{GeoTiffReader, GeoTiffSource};
pub use geotiff_writer::GeoTiffWriter;
pub use memory::{MemoryRaster, MemorySource, MemoryWriter};
pub use types::{GeoKeys, GeoTransform, RasterInfo, SampleType, TiffCompression};
