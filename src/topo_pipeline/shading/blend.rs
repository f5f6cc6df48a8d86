use std::path::Path;

use tracing::{debug, instrument};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::{RasterInfo, RasterReader, RasterSource, RasterWriter, RowSink, SampleType};
use crate::topo_pipeline::shading::types::ShadeBlend;

/// Value written to the water mask for flat pixels.
const WATER: f64 = 1.0;
const LAND: f64 = 0.0;

pub(crate) fn check_same_grid(first: (&Path, &RasterInfo), second: (&Path, &RasterInfo)) -> Result<()> {
    let ((first_path, first), (second_path, second)) = (first, second);
    if first.same_grid(second) {
        return Ok(());
    }
    Err(TopoError::GridMismatch(format!(
        "{} is {}x{}, {} is {}x{}",
        first_path.display(),
        first.width,
        first.height,
        second_path.display(),
        second.width,
        second.height
    )))
}

/// Blends a slope raster (degrees) and a hillshade raster into a single F32
/// intensity raster with the slope raster's geometry.
///
/// Pixels where either input is no-data get the output's no-data sentinel, which is
/// the slope sentinel, or the hillshade sentinel when slope has none.
#[instrument(skip_all, fields(slope = %slope_path.display(), hillshade = %hillshade_path.display()))]
pub fn blend_slope_hillshade<S: RasterSource, W: RasterWriter>(
    source: &S,
    writer: &W,
    slope_path: &Path,
    hillshade_path: &Path,
    output_path: &Path,
    blend: &ShadeBlend,
) -> Result<()> {
    let mut slope = source.open(slope_path)?;
    let mut hillshade = source.open(hillshade_path)?;
    let slope_info = slope.info().clone();
    let hillshade_info = hillshade.info().clone();

    check_same_grid((slope_path, &slope_info), (hillshade_path, &hillshade_info))?;

    let nodata = slope_info.nodata.or(hillshade_info.nodata);
    let output_info = RasterInfo::new(slope_info.width, slope_info.height, 1, SampleType::F32)
        .with_geometry_of(&slope_info)
        .with_nodata(nodata);

    debug!(?blend, ?nodata, "Blending slope and hillshade");

    let width = slope_info.width;
    let mut slope_line = vec![0.0; width];
    let mut hillshade_line = vec![0.0; width];
    let mut out_line = vec![0.0; width];

    writer.write_raster(output_path, &output_info, &mut |sink: &mut dyn RowSink| {
        for row in 0..slope_info.height {
            slope.read_row(0, row, &mut slope_line)?;
            hillshade.read_row(0, row, &mut hillshade_line)?;

            for ((out, &s), &h) in out_line.iter_mut().zip(&slope_line).zip(&hillshade_line) {
                *out = match nodata {
                    Some(sentinel) if slope_info.is_nodata(s) || hillshade_info.is_nodata(h) => sentinel,
                    _ => blend.apply(s, h),
                };
            }

            sink.write_row(0, row, &out_line)?;
        }
        Ok(())
    })
}

/// Writes a U8 mask that is 1 where the slope is exactly zero and 0 elsewhere.
///
/// The mask uses 0 as its no-data value, so slope no-data pixels end up as 0 too.
#[instrument(skip_all, fields(slope = %slope_path.display()))]
pub fn slope_water_mask<S: RasterSource, W: RasterWriter>(
    source: &S,
    writer: &W,
    slope_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let mut slope = source.open(slope_path)?;
    let slope_info = slope.info().clone();

    let output_info = RasterInfo::new(slope_info.width, slope_info.height, 1, SampleType::U8)
        .with_geometry_of(&slope_info)
        .with_nodata(Some(LAND));

    let mut slope_line = vec![0.0; slope_info.width];
    let mut mask_line = vec![LAND; slope_info.width];

    writer.write_raster(output_path, &output_info, &mut |sink: &mut dyn RowSink| {
        for row in 0..slope_info.height {
            slope.read_row(0, row, &mut slope_line)?;

            for (mask, &s) in mask_line.iter_mut().zip(&slope_line) {
                *mask = if s == 0.0 && !slope_info.is_nodata(s) { WATER } else { LAND };
            }

            sink.write_row(0, row, &mask_line)?;
        }
        Ok(())
    })
}
