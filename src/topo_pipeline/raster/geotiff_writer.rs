use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::{debug, instrument, warn};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::geotiff_reader::{
    GDAL_NODATA, GEO_ASCII_PARAMS, GEO_DOUBLE_PARAMS, GEO_KEY_DIRECTORY, MODEL_PIXEL_SCALE,
    MODEL_TIEPOINT, MODEL_TRANSFORMATION, tag,
};
use crate::topo_pipeline::raster::types::{RasterInfo, SampleType, TiffCompression};
use crate::topo_pipeline::raster::writer::{FromSample, InterleavedRowSink, RasterWriter, RowSink};

const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_LZW: u16 = 5;
const COMPRESSION_DEFLATE: u16 = 8;
const PREDICTOR_HORIZONTAL: u16 = 2;
const PHOTOMETRIC_MIN_IS_BLACK: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PLANAR_CHUNKY: u16 = 1;
const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_FLOAT: u16 = 3;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

/// Streams rasters into pixel-interleaved GeoTIFF files, one strip per scan line.
///
/// Strips are compressed here and handed to the directory encoder as opaque data,
/// so the strip layout and compression tags are written explicitly.
#[derive(Debug, Clone)]
pub struct GeoTiffWriter {
    compression: TiffCompression,
    predictor: Option<u16>,
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        Self {
            compression: TiffCompression::Lzw,
            predictor: Some(2),
        }
    }
}

impl GeoTiffWriter {
    /// `predictor` 2 enables horizontal differencing. It only applies to compressed
    /// 8-bit output and is ignored otherwise.
    pub fn new(compression: TiffCompression, predictor: Option<u16>) -> Self {
        Self {
            compression,
            predictor,
        }
    }

    fn uses_predictor(&self, sample_type: SampleType) -> bool {
        self.compression != TiffCompression::None
            && sample_type == SampleType::U8
            && self.predictor == Some(PREDICTOR_HORIZONTAL)
    }

    fn encode(
        &self,
        path: &Path,
        info: &RasterInfo,
        fill: &mut dyn FnMut(&mut dyn RowSink) -> Result<()>,
    ) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            TopoError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;

        let compressor = StripCompressor::from(self.compression);
        let predict = self.uses_predictor(info.sample_type);

        let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(encode_error)?;
        let mut dir = encoder.image_directory().map_err(encode_error)?;

        let (bits, format) = match info.sample_type {
            SampleType::U8 => (u8::BITS_PER_SAMPLE, u8::SAMPLE_FORMAT),
            _ => (f32::BITS_PER_SAMPLE, f32::SAMPLE_FORMAT),
        };
        let photometric = if info.bands == 1 {
            PHOTOMETRIC_MIN_IS_BLACK
        } else {
            PHOTOMETRIC_RGB
        };

        dir.write_tag(Tag::ImageWidth, to_u32(info.width)?).map_err(encode_error)?;
        dir.write_tag(Tag::ImageLength, to_u32(info.height)?).map_err(encode_error)?;
        dir.write_tag(Tag::BitsPerSample, vec![bits; info.bands].as_slice())
            .map_err(encode_error)?;
        dir.write_tag(Tag::SampleFormat, vec![format; info.bands].as_slice())
            .map_err(encode_error)?;
        dir.write_tag(Tag::SamplesPerPixel, info.bands as u16).map_err(encode_error)?;
        dir.write_tag(Tag::PhotometricInterpretation, photometric).map_err(encode_error)?;
        dir.write_tag(Tag::PlanarConfiguration, PLANAR_CHUNKY).map_err(encode_error)?;
        dir.write_tag(Tag::Compression, compressor.code()).map_err(encode_error)?;
        dir.write_tag(Tag::RowsPerStrip, 1u32).map_err(encode_error)?;
        if info.bands == 4 {
            dir.write_tag(Tag::ExtraSamples, EXTRA_SAMPLE_UNASSOCIATED_ALPHA)
                .map_err(encode_error)?;
        }
        if predict {
            dir.write_tag(Tag::Predictor, PREDICTOR_HORIZONTAL).map_err(encode_error)?;
        }
        write_geo_tags(&mut dir, info)?;

        match info.sample_type {
            SampleType::U8 => write_strips::<_, _, u8>(&mut dir, info, compressor, predict, fill)?,
            _ => write_strips::<_, _, f32>(&mut dir, info, compressor, false, fill)?,
        }

        dir.finish().map_err(encode_error)
    }
}

impl RasterWriter for GeoTiffWriter {
    #[instrument(skip(self, info, fill), fields(path = %path.display(), width = info.width, height = info.height, bands = info.bands))]
    fn write_raster(
        &self,
        path: &Path,
        info: &RasterInfo,
        fill: &mut dyn FnMut(&mut dyn RowSink) -> Result<()>,
    ) -> Result<()> {
        if info.width == 0 || info.height == 0 {
            return Err(TopoError::InvalidDimensions(info.width, info.height));
        }
        check_layout(info)?;

        let result = self.encode(path, info, fill);
        if result.is_err() && path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove partial output {}: {}", path.display(), e);
            }
        }
        result
    }
}

fn check_layout(info: &RasterInfo) -> Result<()> {
    match (info.sample_type, info.bands) {
        (SampleType::U8 | SampleType::F32, 1 | 3 | 4) => Ok(()),
        (sample_type, bands) => Err(TopoError::UnsupportedFormat(format!(
            "GeoTIFF output with {} band(s) of {:?}",
            bands, sample_type
        ))),
    }
}

fn encode_error(e: tiff::TiffError) -> TopoError {
    TopoError::EncodeError(e.to_string())
}

fn to_u32(value: impl TryInto<u32> + Copy + std::fmt::Display) -> Result<u32> {
    value.try_into().map_err(|_| {
        TopoError::EncodeError(format!("{} does not fit a classic TIFF offset or size", value))
    })
}

/// Samples as stored in a strip.
trait StripSample: FromSample {
    const BITS_PER_SAMPLE: u16;
    const SAMPLE_FORMAT: u16;

    fn extend_bytes(samples: &[Self], out: &mut Vec<u8>);
}

impl StripSample for u8 {
    const BITS_PER_SAMPLE: u16 = 8;
    const SAMPLE_FORMAT: u16 = SAMPLE_FORMAT_UINT;

    fn extend_bytes(samples: &[Self], out: &mut Vec<u8>) {
        out.extend_from_slice(samples);
    }
}

impl StripSample for f32 {
    const BITS_PER_SAMPLE: u16 = 32;
    const SAMPLE_FORMAT: u16 = SAMPLE_FORMAT_FLOAT;

    // The encoder writes the header in native byte order.
    fn extend_bytes(samples: &[Self], out: &mut Vec<u8>) {
        for sample in samples {
            out.extend_from_slice(&sample.to_ne_bytes());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StripCompressor {
    None,
    Lzw,
    Deflate(flate2::Compression),
}

impl From<TiffCompression> for StripCompressor {
    fn from(compression: TiffCompression) -> Self {
        match compression {
            TiffCompression::None => StripCompressor::None,
            TiffCompression::Lzw => StripCompressor::Lzw,
            TiffCompression::DeflateFast => StripCompressor::Deflate(flate2::Compression::fast()),
            TiffCompression::DeflateBalanced => StripCompressor::Deflate(flate2::Compression::default()),
            TiffCompression::DeflateBest => StripCompressor::Deflate(flate2::Compression::best()),
        }
    }
}

impl StripCompressor {
    fn code(self) -> u16 {
        match self {
            StripCompressor::None => COMPRESSION_NONE,
            StripCompressor::Lzw => COMPRESSION_LZW,
            StripCompressor::Deflate(_) => COMPRESSION_DEFLATE,
        }
    }

    fn compress(self, raw: &[u8]) -> Result<Cow<'_, [u8]>> {
        match self {
            StripCompressor::None => Ok(Cow::Borrowed(raw)),
            StripCompressor::Lzw => {
                let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
                let out = encoder
                    .encode(raw)
                    .map_err(|e| TopoError::EncodeError(format!("LZW: {}", e)))?;
                Ok(Cow::Owned(out))
            }
            StripCompressor::Deflate(level) => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), level);
                encoder.write_all(raw)?;
                Ok(Cow::Owned(encoder.finish()?))
            }
        }
    }
}

/// Horizontal differencing of one chunky 8-bit row, done in place.
fn horizontal_difference(row: &mut [u8], samples_per_pixel: usize) {
    for i in (samples_per_pixel..row.len()).rev() {
        row[i] = row[i].wrapping_sub(row[i - samples_per_pixel]);
    }
}

fn write_strips<W, K, T>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    info: &RasterInfo,
    compressor: StripCompressor,
    predict: bool,
    fill: &mut dyn FnMut(&mut dyn RowSink) -> Result<()>,
) -> Result<()>
where
    W: Write + Seek,
    K: TiffKind,
    T: StripSample,
{
    let mut offsets: Vec<u32> = Vec::with_capacity(info.height);
    let mut byte_counts: Vec<u32> = Vec::with_capacity(info.height);
    let mut raw = Vec::with_capacity(info.width * info.bands * std::mem::size_of::<T>());

    let rows = {
        let mut sink = InterleavedRowSink::new(info, |_row, pixels: &[T]| {
            raw.clear();
            T::extend_bytes(pixels, &mut raw);
            if predict {
                horizontal_difference(&mut raw, info.bands);
            }

            let strip = compressor.compress(&raw)?;
            let offset = dir.write_data(&strip[..]).map_err(encode_error)?;
            offsets.push(to_u32(offset)?);
            byte_counts.push(to_u32(strip.len())?);
            Ok(())
        });
        fill(&mut sink)?;
        sink.finish()?;
        sink.rows_written()
    };

    dir.write_tag(Tag::StripOffsets, offsets.as_slice()).map_err(encode_error)?;
    dir.write_tag(Tag::StripByteCounts, byte_counts.as_slice()).map_err(encode_error)?;

    debug!(rows, compression = ?compressor, predict, "GeoTIFF strips written");
    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    info: &RasterInfo,
) -> Result<()> {
    if let Some(gt) = info.geotransform {
        if gt.is_north_up() {
            let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
            let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
            dir.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..]).map_err(encode_error)?;
            dir.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..]).map_err(encode_error)?;
        } else {
            let matrix = [
                gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
                gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ];
            dir.write_tag(tag(MODEL_TRANSFORMATION), &matrix[..]).map_err(encode_error)?;
        }
    }

    if let Some(keys) = &info.projection {
        dir.write_tag(tag(GEO_KEY_DIRECTORY), keys.directory.as_slice())
            .map_err(encode_error)?;
        if !keys.double_params.is_empty() {
            dir.write_tag(tag(GEO_DOUBLE_PARAMS), keys.double_params.as_slice())
                .map_err(encode_error)?;
        }
        if let Some(ascii) = &keys.ascii_params {
            dir.write_tag(tag(GEO_ASCII_PARAMS), ascii.as_str())
                .map_err(encode_error)?;
        }
    }

    if let Some(nodata) = info.nodata {
        dir.write_tag(tag(GDAL_NODATA), format_nodata(nodata).as_str())
            .map_err(encode_error)?;
    }

    Ok(())
}

/// GDAL_NODATA text, written the way GDAL writes it.
pub(crate) fn format_nodata(nodata: f64) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", nodata)
    }
}
