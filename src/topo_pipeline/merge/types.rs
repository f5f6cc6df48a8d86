use crate::topo_pipeline::raster::TiffCompression;

/// Configuration for the HSV merge
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Compression of the merged GeoTIFF
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether to reject empty or oversized rasters before merging
    pub validate_dimensions: bool,
    /// Largest accepted width or height when validating dimensions
    pub max_dimension: Option<usize>,
    /// Whether to composite row blocks in parallel
    pub parallel: bool,
    /// Rows read, composited and written together when running in parallel
    pub rows_per_block: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::Lzw,
            predictor: Some(2),
            validate_dimensions: true,
            max_dimension: Some(100_000),
            parallel: false,
            rows_per_block: 64,
        }
    }
}

impl MergeConfig {
    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder::default()
    }
}

/// Builder for MergeConfig
#[derive(Default)]
pub struct MergeConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
    parallel: Option<bool>,
    rows_per_block: Option<usize>,
}

impl MergeConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = Some(enable);
        self
    }

    pub fn rows_per_block(mut self, rows: usize) -> Self {
        self.rows_per_block = Some(rows);
        self
    }

    pub fn build(self) -> MergeConfig {
        let default = MergeConfig::default();
        MergeConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
            parallel: self.parallel.unwrap_or(default.parallel),
            rows_per_block: self.rows_per_block.unwrap_or(default.rows_per_block).max(1),
        }
    }
}
