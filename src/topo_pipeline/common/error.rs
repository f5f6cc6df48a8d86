use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopoError {
    #[error("Failed to read input raster: {0}")]
    InputReadError(String),

    #[error("Failed to write output raster: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode raster: {0}")]
    DecodeError(String),

    #[error("Failed to encode raster: {0}")]
    EncodeError(String),

    #[error("Invalid raster dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Raster dimensions differ: color is {color_width}x{color_height}, intensity is {intensity_width}x{intensity_height}")]
    DimensionMismatch {
        color_width: usize,
        color_height: usize,
        intensity_width: usize,
        intensity_height: usize,
    },

    #[error("Rasters are not on the same grid: {0}")]
    GridMismatch(String),

    #[error("Color raster needs at least 3 bands, found {0}")]
    InsufficientBands(usize),

    #[error("Unsupported band count: {0} (expected 3 or 4)")]
    UnsupportedBandCount(usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Row written out of order: expected row {expected}, got row {got}")]
    RowOutOfOrder { expected: usize, got: usize },

    #[error("Raster incomplete: {written} of {expected} rows written")]
    IncompleteRaster { written: usize, expected: usize },

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TopoError>;
