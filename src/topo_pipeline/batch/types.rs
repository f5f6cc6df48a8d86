use std::path::PathBuf;

use crate::topo_pipeline::batch::timing::PipelineTimings;
use crate::topo_pipeline::merge::MergeConfig;
use crate::topo_pipeline::shading::{ShadeBlend, WaterBurn};

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Elevation to color table handed to the color relief step
    pub color_table: PathBuf,
    /// Extension of the DEM files to pick up, without the dot
    pub extension: String,
    /// Keep the per-DEM intermediate rasters instead of deleting them
    pub keep_intermediates: bool,
    pub water: WaterBurn,
    pub blend: ShadeBlend,
    pub merge: MergeConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            color_table: PathBuf::new(),
            extension: "bil".to_string(),
            keep_intermediates: false,
            water: WaterBurn::default(),
            blend: ShadeBlend::default(),
            merge: MergeConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }
}

/// Builder for BatchConfig
#[derive(Default)]
pub struct BatchConfigBuilder {
    color_table: Option<PathBuf>,
    extension: Option<String>,
    keep_intermediates: Option<bool>,
    water_enabled: Option<bool>,
    water: Option<WaterBurn>,
    blend: Option<ShadeBlend>,
    merge: Option<MergeConfig>,
}

impl BatchConfigBuilder {
    pub fn color_table<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.color_table = Some(path.into());
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = Some(keep);
        self
    }

    pub fn water_enabled(mut self, enabled: bool) -> Self {
        self.water_enabled = Some(enabled);
        self
    }

    pub fn water(mut self, water: WaterBurn) -> Self {
        self.water = Some(water);
        self
    }

    pub fn blend(mut self, blend: ShadeBlend) -> Self {
        self.blend = Some(blend);
        self
    }

    pub fn merge(mut self, merge: MergeConfig) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn build(self) -> BatchConfig {
        let default = BatchConfig::default();
        let mut water = self.water.unwrap_or(default.water);
        if let Some(enabled) = self.water_enabled {
            water.enabled = enabled;
        }
        BatchConfig {
            color_table: self.color_table.unwrap_or(default.color_table),
            extension: self
                .extension
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(default.extension),
            keep_intermediates: self.keep_intermediates.unwrap_or(default.keep_intermediates),
            water,
            blend: self.blend.unwrap_or(default.blend),
            merge: self.merge.unwrap_or(default.merge),
        }
    }
}

/// Result of converting one DEM.
#[derive(Debug, Clone)]
pub struct TopoOutput {
    pub dem: PathBuf,
    pub topo: PathBuf,
    /// Water regions burned into the image
    pub water_regions: usize,
    pub timings: PipelineTimings,
}

#[derive(Debug, Clone)]
pub struct DemFailure {
    pub dem: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: Vec<TopoOutput>,
    pub failed: Vec<DemFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
