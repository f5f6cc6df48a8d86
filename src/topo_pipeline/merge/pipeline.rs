use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::hsv::{HsvRow, hsv_to_rgb_into, rgb_to_hsv_into};
use crate::topo_pipeline::merge::types::MergeConfig;
use crate::topo_pipeline::raster::{
    GeoTiffSource, GeoTiffWriter, RasterInfo, RasterReader, RasterSource, RasterWriter,
    RowSink, SampleType,
};

const RED: usize = 0;
const GREEN: usize = 1;
const BLUE: usize = 2;
const ALPHA: usize = 3;

/// Replaces the value channel `v` with `intensity`, except at pixels where the
/// intensity sample is the intensity raster's no-data sentinel.
pub fn composite_value(v: &mut [f64], intensity: &[f64], intensity_info: &RasterInfo) {
    debug_assert_eq!(v.len(), intensity.len());

    if intensity_info.nodata.is_none() {
        v.copy_from_slice(intensity);
        return;
    }

    for (value, &sample) in v.iter_mut().zip(intensity) {
        if !intensity_info.is_nodata(sample) {
            *value = sample;
        }
    }
}

/// Buffers for one output row.
struct ScanLines {
    red: Vec<f64>,
    green: Vec<f64>,
    blue: Vec<f64>,
    intensity: Vec<f64>,
    alpha: Option<Vec<f64>>,
    hsv: HsvRow,
    out_red: Vec<u8>,
    out_green: Vec<u8>,
    out_blue: Vec<u8>,
    scratch: Vec<f64>,
}

impl ScanLines {
    fn new(width: usize, has_alpha: bool) -> Self {
        Self {
            red: vec![0.0; width],
            green: vec![0.0; width],
            blue: vec![0.0; width],
            intensity: vec![0.0; width],
            alpha: has_alpha.then(|| vec![0.0; width]),
            hsv: HsvRow::with_width(width),
            out_red: vec![0; width],
            out_green: vec![0; width],
            out_blue: vec![0; width],
            scratch: vec![0.0; width],
        }
    }

    fn read(&mut self, color: &mut impl RasterReader, intensity: &mut impl RasterReader, row: usize) -> Result<()> {
        color.read_row(RED, row, &mut self.red)?;
        color.read_row(GREEN, row, &mut self.green)?;
        color.read_row(BLUE, row, &mut self.blue)?;
        if let Some(alpha) = self.alpha.as_mut() {
            color.read_row(ALPHA, row, alpha)?;
        }
        intensity.read_row(0, row, &mut self.intensity)
    }

    fn composite(&mut self, intensity_info: &RasterInfo) {
        rgb_to_hsv_into(&self.red, &self.green, &self.blue, &mut self.hsv);
        composite_value(&mut self.hsv.v, &self.intensity, intensity_info);
        hsv_to_rgb_into(&self.hsv, &mut self.out_red, &mut self.out_green, &mut self.out_blue);
    }

    fn write(&mut self, sink: &mut dyn RowSink, row: usize) -> Result<()> {
        for (band, samples) in [(RED, &self.out_red), (GREEN, &self.out_green), (BLUE, &self.out_blue)] {
            for (out, &sample) in self.scratch.iter_mut().zip(samples.iter()) {
                *out = f64::from(sample);
            }
            sink.write_row(band, row, &self.scratch)?;
        }
        if let Some(alpha) = &self.alpha {
            sink.write_row(ALPHA, row, alpha)?;
        }
        Ok(())
    }
}

pub struct HsvMergePipeline<S: RasterSource, W: RasterWriter> {
    source: S,
    writer: W,
    config: MergeConfig,
}

impl HsvMergePipeline<GeoTiffSource, GeoTiffWriter> {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            source: GeoTiffSource,
            writer: GeoTiffWriter::new(config.compression, config.predictor),
            config,
        }
    }
}

impl<S: RasterSource, W: RasterWriter> HsvMergePipeline<S, W> {
    pub fn with_custom(source: S, writer: W, config: MergeConfig) -> Self {
        Self {
            source,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(TopoError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                warn!(
                    "Raster dimensions {}x{} exceed maximum {}",
                    width, height, max
                );
                return Err(TopoError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    fn validate_inputs(&self, color: &RasterInfo, intensity: &RasterInfo) -> Result<()> {
        if color.bands < 3 {
            return Err(TopoError::InsufficientBands(color.bands));
        }
        if color.bands > 4 {
            return Err(TopoError::UnsupportedBandCount(color.bands));
        }
        if !color.same_grid(intensity) {
            return Err(TopoError::DimensionMismatch {
                color_width: color.width,
                color_height: color.height,
                intensity_width: intensity.width,
                intensity_height: intensity.height,
            });
        }
        self.validate_dimensions(color.width, color.height)
    }

    /// Merges the rasters at `intensity_path` and `color_path` into a new raster at
    /// `output_path`, returning the output path.
    #[instrument(skip_all)]
    pub fn merge<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        intensity_path: P,
        color_path: Q,
        output_path: O,
    ) -> Result<PathBuf> {
        let intensity_path = intensity_path.as_ref();
        let color_path = color_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            intensity = %intensity_path.display(),
            color = %color_path.display(),
            output = %output_path.display(),
            "Merging rasters"
        );

        let mut intensity = {
            let _span = tracing::info_span!("open_intensity").entered();
            self.source.open(intensity_path)?
        };
        let mut color = {
            let _span = tracing::info_span!("open_color").entered();
            self.source.open(color_path)?
        };

        self.merge_readers(&mut intensity, &mut color, output_path)?;

        Ok(output_path.to_path_buf())
    }

    /// Merges two already opened rasters into a new raster at `output_path`.
    pub fn merge_readers<I: RasterReader, C: RasterReader>(
        &self,
        intensity: &mut I,
        color: &mut C,
        output_path: &Path,
    ) -> Result<()> {
        let intensity_info = intensity.info().clone();
        let color_info = color.info().clone();

        {
            let _span = tracing::info_span!("validate_inputs",
                width = color_info.width,
                height = color_info.height,
                bands = color_info.bands
            ).entered();
            self.validate_inputs(&color_info, &intensity_info)?;
        }

        let (width, height) = (color_info.width, color_info.height);
        let has_alpha = color_info.bands == 4;
        let output_info = RasterInfo::new(width, height, color_info.bands, SampleType::U8)
            .with_geometry_of(&intensity_info);

        let parallel = self.config.parallel;
        let block_rows = if parallel {
            self.config.rows_per_block.max(1).min(height.max(1))
        } else {
            1
        };
        let mut block: Vec<ScanLines> = (0..block_rows)
            .map(|_| ScanLines::new(width, has_alpha))
            .collect();

        debug!(
            has_alpha,
            nodata = ?intensity_info.nodata,
            parallel,
            block_rows,
            "Compositing rows"
        );

        let _span = tracing::info_span!("composite_rows", height).entered();
        self.writer.write_raster(output_path, &output_info, &mut |sink: &mut dyn RowSink| {
            let mut first = 0;
            while first < height {
                let count = block_rows.min(height - first);
                let lines = &mut block[..count];

                for (offset, scan) in lines.iter_mut().enumerate() {
                    scan.read(&mut *color, &mut *intensity, first + offset)?;
                }

                if parallel {
                    lines.par_iter_mut().for_each(|scan| scan.composite(&intensity_info));
                } else {
                    lines.iter_mut().for_each(|scan| scan.composite(&intensity_info));
                }

                for (offset, scan) in lines.iter_mut().enumerate() {
                    scan.write(sink, first + offset)?;
                }

                first += count;
            }
            Ok(())
        })?;

        info!(width, height, bands = color_info.bands, "Merge complete");
        Ok(())
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }
}

/// Merges two GeoTIFFs with the default configuration.
pub fn hsv_merge<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
    intensity_path: P,
    color_path: Q,
    output_path: O,
) -> Result<PathBuf> {
    HsvMergePipeline::new(MergeConfig::default()).merge(intensity_path, color_path, output_path)
}
