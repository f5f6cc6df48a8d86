//! In-memory raster backend
//!
//! Useful for tests, benchmarks, and for chaining steps without touching disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::reader::{RasterReader, RasterSource};
use crate::topo_pipeline::raster::types::RasterInfo;
use crate::topo_pipeline::raster::writer::{InterleavedRowSink, RasterWriter, RowSink};

/// A raster held as one `Vec<f64>` per band, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRaster {
    info: RasterInfo,
    bands: Vec<Vec<f64>>,
}

impl MemoryRaster {
    /// Zero-filled raster.
    pub fn new(info: RasterInfo) -> Self {
        let bands = vec![vec![0.0; info.width * info.height]; info.bands];
        Self { info, bands }
    }

    pub fn from_bands(info: RasterInfo, bands: Vec<Vec<f64>>) -> Result<Self> {
        let expected = info.width * info.height;
        if bands.len() != info.bands || bands.iter().any(|band| band.len() != expected) {
            return Err(TopoError::InvalidDimensions(info.width, info.height));
        }
        Ok(Self { info, bands })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn band(&self, band: usize) -> &[f64] {
        &self.bands[band]
    }

    pub fn band_mut(&mut self, band: usize) -> &mut [f64] {
        &mut self.bands[band]
    }

    pub fn row(&self, band: usize, row: usize) -> &[f64] {
        let width = self.info.width;
        &self.bands[band][row * width..(row + 1) * width]
    }

    pub fn pixel(&self, band: usize, x: usize, y: usize) -> f64 {
        self.bands[band][y * self.info.width + x]
    }
}

impl RasterReader for MemoryRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_row(&mut self, band: usize, row: usize, out: &mut [f64]) -> Result<()> {
        if band >= self.info.bands || row >= self.info.height || out.len() != self.info.width {
            return Err(TopoError::InputReadError(format!(
                "scan line request out of range: band {}, row {}, width {}",
                band,
                row,
                out.len()
            )));
        }
        out.copy_from_slice(self.row(band, row));
        Ok(())
    }
}

/// Serves [`MemoryRaster`]s registered under paths.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rasters: HashMap<PathBuf, MemoryRaster>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, raster: MemoryRaster) {
        self.rasters.insert(path.into(), raster);
    }

    pub fn with<P: Into<PathBuf>>(mut self, path: P, raster: MemoryRaster) -> Self {
        self.insert(path, raster);
        self
    }
}

impl RasterSource for MemorySource {
    type Reader = MemoryRaster;

    fn open(&self, path: &Path) -> Result<MemoryRaster> {
        self.rasters.get(path).cloned().ok_or_else(|| {
            TopoError::InputReadError(format!("{}: no such raster", path.display()))
        })
    }
}

/// Collects written rasters in memory; clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    written: Arc<Mutex<HashMap<PathBuf, MemoryRaster>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<MemoryRaster> {
        self.store().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    /// A source serving everything written so far.
    pub fn to_source(&self) -> MemorySource {
        MemorySource {
            rasters: self.store().clone(),
        }
    }

    fn store(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, MemoryRaster>> {
        self.written.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RasterWriter for MemoryWriter {
    fn write_raster(
        &self,
        path: &Path,
        info: &RasterInfo,
        fill: &mut dyn FnMut(&mut dyn RowSink) -> Result<()>,
    ) -> Result<()> {
        if info.width == 0 || info.height == 0 {
            return Err(TopoError::InvalidDimensions(info.width, info.height));
        }

        let mut raster = MemoryRaster::new(info.clone());
        {
            let width = info.width;
            let bands = info.bands;
            let target = &mut raster.bands;
            let mut sink = InterleavedRowSink::new(info, |row, pixels: &[f64]| {
                for (band, samples) in target.iter_mut().enumerate() {
                    let line = &mut samples[row * width..(row + 1) * width];
                    for (x, value) in line.iter_mut().enumerate() {
                        *value = pixels[x * bands + band];
                    }
                }
                Ok(())
            });
            fill(&mut sink)?;
            sink.finish()?;
        }

        self.store().insert(path.to_path_buf(), raster);
        Ok(())
    }
}
