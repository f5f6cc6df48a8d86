use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::topo_pipeline::batch::cleanup::CleanupGuard;
use crate::topo_pipeline::batch::dem_processor::{DemProcessor, GdalDemProcessor};
use crate::topo_pipeline::batch::naming::{Product, discover_dems, product_path};
use crate::topo_pipeline::batch::timing::{PipelineTimings, Timer};
use crate::topo_pipeline::batch::types::{BatchConfig, BatchReport, DemFailure, TopoOutput};
use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::merge::HsvMergePipeline;
use crate::topo_pipeline::raster::{GeoTiffSource, GeoTiffWriter};
use crate::topo_pipeline::shading::{blend_slope_hillshade, burn_water, slope_water_mask};

fn timed<T>(timings: &mut PipelineTimings, name: &str, step: impl FnOnce() -> Result<T>) -> Result<T> {
    let _span = tracing::info_span!("step", name).entered();
    let timer = Timer::start(name);
    let result = step();
    let (name, duration) = timer.stop();
    timings.add_step(name, duration);
    result
}

/// Where the water burn writes before replacing the merged image.
fn burn_path(topo: &Path) -> PathBuf {
    topo.with_extension("burn.tif")
}

pub struct TopoBatch<P: DemProcessor = GdalDemProcessor> {
    processor: P,
    merge: HsvMergePipeline<GeoTiffSource, GeoTiffWriter>,
    writer: GeoTiffWriter,
    config: BatchConfig,
}

impl TopoBatch<GdalDemProcessor> {
    pub fn new(config: BatchConfig) -> Self {
        Self::with_processor(GdalDemProcessor::new(), config)
    }
}

impl<P: DemProcessor> TopoBatch<P> {
    pub fn with_processor(processor: P, config: BatchConfig) -> Self {
        Self {
            processor,
            merge: HsvMergePipeline::new(config.merge.clone()),
            writer: GeoTiffWriter::new(config.merge.compression, config.merge.predictor),
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Converts every DEM in `folder`. Failures of single DEMs are logged and
    /// collected in the report; only an unusable folder or color table fails the run.
    #[instrument(skip(self), fields(folder = %folder.display()))]
    pub fn process_folder(&self, folder: &Path) -> Result<BatchReport> {
        if !self.config.color_table.is_file() {
            return Err(TopoError::InputReadError(format!(
                "color table {} not found",
                self.config.color_table.display()
            )));
        }

        let dems = discover_dems(folder, &self.config.extension)?;
        info!(count = dems.len(), extension = %self.config.extension, "Found DEMs");

        let mut report = BatchReport::default();
        for dem in dems {
            let name = dem.file_name().unwrap_or_default().to_string_lossy().into_owned();
            let _span = tracing::info_span!("dem", %name).entered();

            match self.process_dem(&dem) {
                Ok(output) => {
                    info!(topo = %output.topo.display(), "Processed");
                    report.succeeded.push(output);
                }
                Err(e) => {
                    error!("Processing {} failed: {}", name, e);
                    report.failed.push(DemFailure {
                        dem,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Batch complete"
        );
        Ok(report)
    }

    /// Converts one DEM into `<stem>_Topo.tif` next to it.
    pub fn process_dem(&self, dem: &Path) -> Result<TopoOutput> {
        let folder = dem
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let path_of = |product| product_path(folder, dem, product);

        let source = GeoTiffSource;
        let mut intermediates = CleanupGuard::new(self.config.keep_intermediates);
        let mut outputs = CleanupGuard::new(false);
        let mut timings = PipelineTimings::new();

        let color_relief = intermediates.track(path_of(Product::ColorRelief));
        timed(&mut timings, "color_relief", || {
            self.processor.color_relief(dem, &self.config.color_table, &color_relief)
        })?;

        let hillshade = intermediates.track(path_of(Product::Hillshade));
        timed(&mut timings, "hillshade", || self.processor.hillshade(dem, &hillshade))?;

        let slope = intermediates.track(path_of(Product::Slope));
        timed(&mut timings, "slope", || self.processor.slope(dem, &slope))?;

        let slope_hillshade = intermediates.track(path_of(Product::SlopeHillshade));
        timed(&mut timings, "blend", || {
            blend_slope_hillshade(&source, &self.writer, &slope, &hillshade, &slope_hillshade, &self.config.blend)
        })?;

        let topo = outputs.track(path_of(Product::Topo));
        timed(&mut timings, "hsv_merge", || {
            self.merge.merge(&slope_hillshade, &color_relief, &topo).map(|_| ())
        })?;

        let mut water_regions = 0;
        if self.config.water.enabled {
            let water = intermediates.track(path_of(Product::SlopeWater));
            timed(&mut timings, "water_mask", || {
                slope_water_mask(&source, &self.writer, &slope, &water)
            })?;

            let burned = outputs.track(burn_path(&topo));
            water_regions = timed(&mut timings, "water_burn", || {
                burn_water(&source, &self.writer, &topo, &water, &burned, &self.config.water)
            })?;
            fs::rename(&burned, &topo)?;
            outputs.forget(&burned);
        }

        outputs.persist();
        timings.log_summary(&dem.file_name().unwrap_or_default().to_string_lossy());

        Ok(TopoOutput {
            dem: dem.to_path_buf(),
            topo,
            water_regions,
            timings,
        })
    }
}
