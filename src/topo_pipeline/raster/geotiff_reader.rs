//! GeoTIFF reader built on the `tiff` crate.
//!
//! Samples are decoded one chunk row at a time (one strip, or one row of tiles) and
//! cached, so reading a raster line by line keeps at most `width * chunk_height`
//! samples per band in memory regardless of raster height.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::reader::{RasterReader, RasterSource};
use crate::topo_pipeline::raster::types::{GeoKeys, GeoTransform, RasterInfo, SampleType};

pub(crate) const MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const MODEL_TIEPOINT: u16 = 33922;
pub(crate) const MODEL_TRANSFORMATION: u16 = 34264;
pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GEO_DOUBLE_PARAMS: u16 = 34736;
pub(crate) const GEO_ASCII_PARAMS: u16 = 34737;
pub(crate) const GDAL_NODATA: u16 = 42113;

/// TIFF tag for a numeric code, resolving to the named variant when the `tiff`
/// crate knows it.
pub(crate) fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Opens GeoTIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffSource;

impl RasterSource for GeoTiffSource {
    type Reader = GeoTiffReader;

    fn open(&self, path: &Path) -> Result<GeoTiffReader> {
        GeoTiffReader::open(path)
    }
}

/// Decoded chunk row: `rows` full-width, pixel-interleaved scan lines.
struct ChunkRow {
    index: usize,
    first_row: usize,
    samples: Vec<f64>,
}

pub struct GeoTiffReader {
    decoder: Decoder<BufReader<File>>,
    info: RasterInfo,
    samples_per_pixel: usize,
    chunk_width: usize,
    chunk_height: usize,
    chunks_across: usize,
    cached: Option<ChunkRow>,
}

impl GeoTiffReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let input_error = |e: &dyn std::fmt::Display| {
            TopoError::InputReadError(format!("{}: {}", path.display(), e))
        };

        let file = File::open(path).map_err(|e| input_error(&e))?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| input_error(&e))?;

        let (width, height) = decoder.dimensions().map_err(|e| input_error(&e))?;
        let (width, height) = (width as usize, height as usize);

        let samples_per_pixel = read_unsigned_tag(&mut decoder, Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
        let planar = read_unsigned_tag(&mut decoder, Tag::PlanarConfiguration)?.unwrap_or(1);
        if planar != 1 {
            return Err(TopoError::UnsupportedFormat(format!(
                "{}: band-separate (planar) TIFF layout",
                path.display()
            )));
        }

        let sample_type = read_sample_type(&mut decoder)?;
        let geotransform = read_geotransform(&mut decoder)?;
        let projection = read_geokeys(&mut decoder)?;
        let nodata = read_nodata(&mut decoder)?;

        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let (chunk_width, chunk_height) = (chunk_width as usize, chunk_height as usize);
        if chunk_width == 0 || chunk_height == 0 {
            return Err(TopoError::DecodeError(format!(
                "{}: invalid chunk size {}x{}",
                path.display(),
                chunk_width,
                chunk_height
            )));
        }

        debug!(
            path = %path.display(),
            width,
            height,
            bands = samples_per_pixel,
            ?sample_type,
            chunk_width,
            chunk_height,
            ?nodata,
            "Opened GeoTIFF"
        );

        let info = RasterInfo::new(width, height, samples_per_pixel, sample_type)
            .with_nodata(nodata)
            .with_geotransform(geotransform)
            .with_projection(projection);

        Ok(Self {
            decoder,
            info,
            samples_per_pixel,
            chunk_width,
            chunk_height,
            chunks_across: width.div_ceil(chunk_width),
            cached: None,
        })
    }

    fn load_chunk_row(&mut self, index: usize) -> Result<ChunkRow> {
        let width = self.info.width;
        let spp = self.samples_per_pixel;
        let first_row = index * self.chunk_height;
        let rows = self.chunk_height.min(self.info.height - first_row);
        let mut samples = vec![0.0; rows * width * spp];

        for across in 0..self.chunks_across {
            let chunk_index = index * self.chunks_across + across;
            let x0 = across * self.chunk_width;
            let data_width = self.chunk_width.min(width - x0);

            let decoded = self
                .decoder
                .read_chunk(chunk_index as u32)
                .map_err(|e| TopoError::DecodeError(format!("chunk {}: {}", chunk_index, e)))?;
            let data = decoding_to_f64(decoded)?;

            // Edge chunks come back either cropped to the image or padded to full size.
            let stride = if data.len() == data_width * rows * spp {
                data_width
            } else if data.len() >= self.chunk_width * rows * spp {
                self.chunk_width
            } else {
                return Err(TopoError::DecodeError(format!(
                    "chunk {} holds {} samples, expected {}",
                    chunk_index,
                    data.len(),
                    data_width * rows * spp
                )));
            };

            for r in 0..rows {
                let src = &data[r * stride * spp..][..data_width * spp];
                let dst = &mut samples[(r * width + x0) * spp..][..data_width * spp];
                dst.copy_from_slice(src);
            }
        }

        Ok(ChunkRow {
            index,
            first_row,
            samples,
        })
    }
}

impl RasterReader for GeoTiffReader {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_row(&mut self, band: usize, row: usize, out: &mut [f64]) -> Result<()> {
        if band >= self.info.bands || row >= self.info.height || out.len() != self.info.width {
            return Err(TopoError::InputReadError(format!(
                "scan line request out of range: band {}, row {}, width {} (raster is {}x{}x{})",
                band,
                row,
                out.len(),
                self.info.width,
                self.info.height,
                self.info.bands
            )));
        }

        let index = row / self.chunk_height;
        let cached = match self.cached.take() {
            Some(chunk_row) if chunk_row.index == index => chunk_row,
            _ => self.load_chunk_row(index)?,
        };

        let spp = self.samples_per_pixel;
        let line = &cached.samples[(row - cached.first_row) * self.info.width * spp..];
        for (x, value) in out.iter_mut().enumerate() {
            *value = line[x * spp + band];
        }

        self.cached = Some(cached);
        Ok(())
    }
}

fn decode_error(e: tiff::TiffError) -> TopoError {
    TopoError::DecodeError(e.to_string())
}

fn read_unsigned_tag(decoder: &mut Decoder<BufReader<File>>, tag: Tag) -> Result<Option<u32>> {
    decoder
        .find_tag(tag)
        .map_err(decode_error)?
        .map(|value| value.into_u32())
        .transpose()
        .map_err(decode_error)
}

fn read_f64_tag(decoder: &mut Decoder<BufReader<File>>, code: u16) -> Result<Option<Vec<f64>>> {
    decoder
        .find_tag(tag(code))
        .map_err(decode_error)?
        .map(|value| value.into_f64_vec())
        .transpose()
        .map_err(decode_error)
}

fn read_ascii_tag(decoder: &mut Decoder<BufReader<File>>, code: u16) -> Result<Option<String>> {
    decoder
        .find_tag(tag(code))
        .map_err(decode_error)?
        .map(|value| value.into_string())
        .transpose()
        .map_err(decode_error)
}

fn read_sample_type(decoder: &mut Decoder<BufReader<File>>) -> Result<SampleType> {
    let bits = decoder
        .find_tag(Tag::BitsPerSample)
        .map_err(decode_error)?
        .map(|value| value.into_u16_vec())
        .transpose()
        .map_err(decode_error)?
        .and_then(|bits| bits.first().copied())
        .unwrap_or(1);
    let format = decoder
        .find_tag(Tag::SampleFormat)
        .map_err(decode_error)?
        .map(|value| value.into_u16_vec())
        .transpose()
        .map_err(decode_error)?
        .and_then(|formats| formats.first().copied())
        .unwrap_or(1);

    match (format, bits) {
        (1, 8) => Ok(SampleType::U8),
        (2, 8) => Ok(SampleType::I8),
        (1, 16) => Ok(SampleType::U16),
        (2, 16) => Ok(SampleType::I16),
        (1, 32) => Ok(SampleType::U32),
        (2, 32) => Ok(SampleType::I32),
        (3, 32) => Ok(SampleType::F32),
        (3, 64) => Ok(SampleType::F64),
        _ => Err(TopoError::UnsupportedFormat(format!(
            "sample format {} with {} bits per sample",
            format, bits
        ))),
    }
}

fn read_geotransform(decoder: &mut Decoder<BufReader<File>>) -> Result<Option<GeoTransform>> {
    if let Some(m) = read_f64_tag(decoder, MODEL_TRANSFORMATION)? {
        if m.len() >= 8 {
            return Ok(Some(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]])));
        }
        warn!("Ignoring ModelTransformation tag with {} values", m.len());
    }

    let scale = read_f64_tag(decoder, MODEL_PIXEL_SCALE)?;
    let tiepoint = read_f64_tag(decoder, MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) if scale.len() >= 2 && tiepoint.len() >= 6 => {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            Ok(Some(GeoTransform::north_up(origin_x, origin_y, scale[0], -scale[1])))
        }
        _ => Ok(None),
    }
}

fn read_geokeys(decoder: &mut Decoder<BufReader<File>>) -> Result<Option<GeoKeys>> {
    let directory = decoder
        .find_tag(tag(GEO_KEY_DIRECTORY))
        .map_err(decode_error)?
        .map(|value| value.into_u16_vec())
        .transpose()
        .map_err(decode_error)?;

    let Some(directory) = directory else {
        return Ok(None);
    };

    Ok(Some(GeoKeys {
        directory,
        double_params: read_f64_tag(decoder, GEO_DOUBLE_PARAMS)?.unwrap_or_default(),
        ascii_params: read_ascii_tag(decoder, GEO_ASCII_PARAMS)?,
    }))
}

fn read_nodata(decoder: &mut Decoder<BufReader<File>>) -> Result<Option<f64>> {
    let Some(text) = read_ascii_tag(decoder, GDAL_NODATA)? else {
        return Ok(None);
    };
    Ok(parse_nodata(&text))
}

pub(crate) fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.to_ascii_lowercase().contains("nan") {
        return Some(f64::NAN);
    }
    match trimmed.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable GDAL_NODATA value {:?}", text);
            None
        }
    }
}

fn decoding_to_f64(result: DecodingResult) -> Result<Vec<f64>> {
    let samples = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(TopoError::UnsupportedFormat(
                "unsupported TIFF sample encoding".to_string(),
            ));
        }
    };
    Ok(samples)
}
