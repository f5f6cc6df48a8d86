use std::path::Path;

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::types::RasterInfo;

/// Receives scan lines of a raster under construction.
///
/// Rows must arrive in order; a row is complete once every band has been written.
pub trait RowSink {
    fn write_row(&mut self, band: usize, row: usize, samples: &[f64]) -> Result<()>;
}

/// Creates rasters.
///
/// `fill` is handed a [`RowSink`] for the new raster and must write every row of
/// every band. The raster is finalized when `fill` returns successfully; on failure
/// nothing valid is left at `path`.
pub trait RasterWriter {
    fn write_raster(
        &self,
        path: &Path,
        info: &RasterInfo,
        fill: &mut dyn FnMut(&mut dyn RowSink) -> Result<()>,
    ) -> Result<()>;
}

/// Conversion from the pipeline's `f64` samples to a stored sample type.
pub(crate) trait FromSample: Copy + Default {
    fn from_sample(value: f64) -> Self;
}

impl FromSample for u8 {
    fn from_sample(value: f64) -> Self {
        value.clamp(0.0, 255.0) as u8
    }
}

impl FromSample for f32 {
    fn from_sample(value: f64) -> Self {
        value as f32
    }
}

impl FromSample for f64 {
    fn from_sample(value: f64) -> Self {
        value
    }
}

/// Assembles per-band scan lines into pixel-interleaved rows and hands each
/// completed row to `emit`.
pub(crate) struct InterleavedRowSink<T, F>
where
    F: FnMut(usize, &[T]) -> Result<()>,
{
    width: usize,
    height: usize,
    bands: usize,
    next_row: usize,
    pending: Vec<T>,
    filled: Vec<bool>,
    emit: F,
}

impl<T, F> InterleavedRowSink<T, F>
where
    T: FromSample,
    F: FnMut(usize, &[T]) -> Result<()>,
{
    pub(crate) fn new(info: &RasterInfo, emit: F) -> Self {
        Self {
            width: info.width,
            height: info.height,
            bands: info.bands,
            next_row: 0,
            pending: vec![T::default(); info.width * info.bands],
            filled: vec![false; info.bands],
            emit,
        }
    }

    pub(crate) fn rows_written(&self) -> usize {
        self.next_row
    }

    /// Fails unless every row has been emitted.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.next_row != self.height {
            return Err(TopoError::IncompleteRaster {
                written: self.next_row,
                expected: self.height,
            });
        }
        Ok(())
    }
}

impl<T, F> RowSink for InterleavedRowSink<T, F>
where
    T: FromSample,
    F: FnMut(usize, &[T]) -> Result<()>,
{
    fn write_row(&mut self, band: usize, row: usize, samples: &[f64]) -> Result<()> {
        if band >= self.bands {
            return Err(TopoError::OutputWriteError(format!(
                "band {} out of range for {} bands",
                band, self.bands
            )));
        }
        if samples.len() != self.width {
            return Err(TopoError::OutputWriteError(format!(
                "scan line has {} samples, raster width is {}",
                samples.len(),
                self.width
            )));
        }
        if row != self.next_row || row >= self.height {
            return Err(TopoError::RowOutOfOrder {
                expected: self.next_row,
                got: row,
            });
        }

        for (x, &value) in samples.iter().enumerate() {
            self.pending[x * self.bands + band] = T::from_sample(value);
        }
        self.filled[band] = true;

        if self.filled.iter().all(|&f| f) {
            (self.emit)(row, &self.pending)?;
            self.filled.fill(false);
            self.next_row += 1;
        }

        Ok(())
    }
}
