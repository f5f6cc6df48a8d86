//! Raster metadata types

/// Sample storage type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (GDAL's usual choice for 8-bit imagery)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Affine transform from pixel/line to map coordinates, in GDAL coefficient order.
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Area covered by a single pixel, in squared map units.
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation).abs()
    }
}

/// GeoTIFF projection descriptor, kept as the raw GeoKey tags so it can be copied
/// from one file to another without interpretation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoKeys {
    /// GeoKeyDirectoryTag contents
    pub directory: Vec<u16>,
    /// GeoDoubleParamsTag contents
    pub double_params: Vec<f64>,
    /// GeoAsciiParamsTag contents
    pub ascii_params: Option<String>,
}

/// Geometry and sample layout of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub sample_type: SampleType,
    /// No-data sentinel, shared by every band (GeoTIFF stores a single value)
    pub nodata: Option<f64>,
    pub geotransform: Option<GeoTransform>,
    pub projection: Option<GeoKeys>,
}

impl RasterInfo {
    pub fn new(width: usize, height: usize, bands: usize, sample_type: SampleType) -> Self {
        Self {
            width,
            height,
            bands,
            sample_type,
            nodata: None,
            geotransform: None,
            projection: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_geotransform(mut self, geotransform: Option<GeoTransform>) -> Self {
        self.geotransform = geotransform;
        self
    }

    pub fn with_projection(mut self, projection: Option<GeoKeys>) -> Self {
        self.projection = projection;
        self
    }

    /// Copies geotransform and projection from `other`.
    pub fn with_geometry_of(self, other: &RasterInfo) -> Self {
        self.with_geotransform(other.geotransform)
            .with_projection(other.projection.clone())
    }

    /// True when `sample` is this raster's no-data sentinel. A NaN sentinel matches NaN.
    pub fn is_nodata(&self, sample: f64) -> bool {
        match self.nodata {
            Some(nodata) if nodata.is_nan() => sample.is_nan(),
            Some(nodata) => sample == nodata,
            None => false,
        }
    }

    pub fn same_grid(&self, other: &RasterInfo) -> bool {
        self.width == other.width && self.height == other.height
    }
}
