#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::path::Path;

    use tiff::decoder::Decoder;
    use tiff::tags::Tag;

    use crate::topo_pipeline::common::error::{Result, TopoError};
    use crate::topo_pipeline::raster::geotiff_reader::parse_nodata;
    use crate::topo_pipeline::raster::{
        GeoKeys, GeoTiffReader, GeoTiffWriter, GeoTransform, MemoryRaster, MemorySource,
        MemoryWriter, RasterInfo, RasterReader, RasterSource, RasterWriter, RowSink,
        SampleType, TiffCompression,
    };

    fn wgs84_keys() -> GeoKeys {
        GeoKeys {
            directory: vec![
                1, 1, 0, 3,
                1024, 0, 1, 2,
                1025, 0, 1, 1,
                2048, 0, 1, 4326,
            ],
            double_params: vec![298.257223563, 6378137.0],
            ascii_params: Some("WGS 84|".to_string()),
        }
    }

    fn write_bands(writer: &dyn RasterWriter, path: &Path, info: &RasterInfo, bands: &[Vec<f64>]) -> Result<()> {
        writer.write_raster(path, info, &mut |sink: &mut dyn RowSink| {
            for row in 0..info.height {
                for (band, samples) in bands.iter().enumerate() {
                    sink.write_row(band, row, &samples[row * info.width..(row + 1) * info.width])?;
                }
            }
            Ok(())
        })
    }

    #[test]
    fn test_memory_writer_collects_rows() {
        let info = RasterInfo::new(3, 2, 2, SampleType::F32);
        let bands = vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![-1.0, -2.0, -3.0, -4.0, -5.0, -6.0],
        ];
        let writer = MemoryWriter::new();
        write_bands(&writer, Path::new("out.tif"), &info, &bands).unwrap();

        let raster = writer.get(Path::new("out.tif")).unwrap();
        assert_eq!(raster.band(0), bands[0].as_slice());
        assert_eq!(raster.band(1), bands[1].as_slice());
        assert_eq!(raster.pixel(1, 2, 1), -6.0);
    }

    #[test]
    fn test_rows_must_arrive_in_order() {
        let info = RasterInfo::new(2, 3, 1, SampleType::U8);
        let writer = MemoryWriter::new();

        let result = writer.write_raster(Path::new("out.tif"), &info, &mut |sink: &mut dyn RowSink| {
            sink.write_row(0, 0, &[1.0, 2.0])?;
            sink.write_row(0, 2, &[1.0, 2.0])?;
            Ok(())
        });

        assert!(matches!(result, Err(TopoError::RowOutOfOrder { expected: 1, got: 2 })));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_row_completes_only_when_all_bands_written() {
        let info = RasterInfo::new(2, 2, 3, SampleType::U8);
        let writer = MemoryWriter::new();

        let result = writer.write_raster(Path::new("out.tif"), &info, &mut |sink: &mut dyn RowSink| {
            sink.write_row(0, 0, &[1.0, 2.0])?;
            sink.write_row(1, 0, &[1.0, 2.0])?;
            // Band 2 of row 0 is still missing, so row 1 is out of order.
            sink.write_row(0, 1, &[1.0, 2.0])
        });

        assert!(matches!(result, Err(TopoError::RowOutOfOrder { expected: 0, got: 1 })));
    }

    #[test]
    fn test_missing_rows_are_reported() {
        let info = RasterInfo::new(2, 3, 1, SampleType::U8);
        let writer = MemoryWriter::new();

        let result = writer.write_raster(Path::new("out.tif"), &info, &mut |sink: &mut dyn RowSink| {
            sink.write_row(0, 0, &[1.0, 2.0])
        });

        assert!(matches!(result, Err(TopoError::IncompleteRaster { written: 1, expected: 3 })));
    }

    #[test]
    fn test_wrong_scan_line_width_is_rejected() {
        let info = RasterInfo::new(4, 1, 1, SampleType::U8);
        let writer = MemoryWriter::new();

        let result = writer.write_raster(Path::new("out.tif"), &info, &mut |sink: &mut dyn RowSink| {
            sink.write_row(0, 0, &[1.0, 2.0])
        });

        assert!(matches!(result, Err(TopoError::OutputWriteError(_))));
    }

    #[test]
    fn test_memory_source_missing_path() {
        let source = MemorySource::new();
        let result = source.open(Path::new("missing.tif"));
        assert!(matches!(result, Err(TopoError::InputReadError(_))));
    }

    #[test]
    fn test_memory_raster_rejects_wrong_band_length() {
        let info = RasterInfo::new(2, 2, 1, SampleType::U8);
        assert!(MemoryRaster::from_bands(info, vec![vec![0.0; 3]]).is_err());
    }

    #[test]
    fn test_geotiff_rgb_round_trip_keeps_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.tif");

        let (width, height) = (5, 4);
        let info = RasterInfo::new(width, height, 3, SampleType::U8)
            .with_geotransform(Some(GeoTransform::north_up(-122.5, 47.75, 0.25, -0.25)))
            .with_projection(Some(wgs84_keys()))
            .with_nodata(Some(0.0));
        let bands: Vec<Vec<f64>> = (0..3)
            .map(|b| (0..width * height).map(|i| ((i * 7 + b * 50) % 256) as f64).collect())
            .collect();

        let writer = GeoTiffWriter::new(TiffCompression::Lzw, Some(2));
        write_bands(&writer, &path, &info, &bands).unwrap();

        let mut reader = GeoTiffReader::open(&path).unwrap();
        let read_info = reader.info().clone();
        assert_eq!(read_info.width, width);
        assert_eq!(read_info.height, height);
        assert_eq!(read_info.bands, 3);
        assert_eq!(read_info.sample_type, SampleType::U8);
        assert_eq!(read_info.nodata, Some(0.0));
        assert_eq!(read_info.geotransform, info.geotransform);

        let keys = read_info.projection.unwrap();
        assert_eq!(keys.directory, wgs84_keys().directory);
        assert_eq!(keys.double_params, wgs84_keys().double_params);
        assert_eq!(keys.ascii_params.unwrap().trim_end_matches('\0'), "WGS 84|");

        let mut line = vec![0.0; width];
        for row in (0..height).rev() {
            for band in 0..3 {
                reader.read_row(band, row, &mut line).unwrap();
                assert_eq!(line, bands[band][row * width..(row + 1) * width]);
            }
        }
    }

    #[test]
    fn test_geotiff_float_with_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slope.tif");

        let gt = GeoTransform::from_gdal([1000.0, 30.0, 2.5, 5000.0, -1.5, -30.0]);
        let info = RasterInfo::new(3, 2, 1, SampleType::F32)
            .with_geotransform(Some(gt))
            .with_nodata(Some(-9999.0));
        let bands = vec![vec![0.0, 12.5, -9999.0, 89.75, 45.0, 3.25]];

        write_bands(&GeoTiffWriter::new(TiffCompression::None, None), &path, &info, &bands).unwrap();

        let mut reader = GeoTiffReader::open(&path).unwrap();
        assert_eq!(reader.info().sample_type, SampleType::F32);
        assert_eq!(reader.info().geotransform, Some(gt));
        assert_eq!(reader.info().nodata, Some(-9999.0));
        assert!(reader.info().projection.is_none());

        let mut line = vec![0.0; 3];
        reader.read_row(0, 1, &mut line).unwrap();
        assert_eq!(line, vec![89.75, 45.0, 3.25]);

        reader.read_row(0, 0, &mut line).unwrap();
        assert!(reader.info().is_nodata(line[2]));
        assert!(!reader.info().is_nodata(line[0]));
    }

    fn tiff_tag(path: &Path, tag: Tag) -> Option<u16> {
        let mut decoder = Decoder::new(File::open(path).unwrap()).unwrap();
        decoder.find_tag(tag).unwrap().map(|value| value.into_u16().unwrap())
    }

    fn gradient_bands(info: &RasterInfo) -> Vec<Vec<f64>> {
        (0..info.bands)
            .map(|b| {
                (0..info.width * info.height)
                    .map(|i| match info.sample_type {
                        SampleType::U8 => ((i * 13 + b * 61) % 256) as f64,
                        _ => (i as f64) * 0.5 - 40.25 + b as f64,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_geotiff_compressed_strips_decode() {
        let compressions = [
            TiffCompression::None,
            TiffCompression::Lzw,
            TiffCompression::DeflateFast,
            TiffCompression::DeflateBalanced,
            TiffCompression::DeflateBest,
        ];
        let layouts = [
            (4, SampleType::U8, Some(2)),
            (4, SampleType::U8, None),
            (3, SampleType::U8, Some(2)),
            (1, SampleType::F32, Some(2)),
            (1, SampleType::F32, None),
        ];
        let dir = tempfile::tempdir().unwrap();

        for compression in compressions {
            for (bands, sample_type, predictor) in layouts {
                let path = dir.path().join(format!("{:?}_{}_{:?}_{:?}.tif", compression, bands, sample_type, predictor));
                let info = RasterInfo::new(37, 6, bands, sample_type)
                    .with_geotransform(Some(GeoTransform::north_up(10.0, 20.0, 0.5, -0.5)));
                let expected = gradient_bands(&info);

                write_bands(&GeoTiffWriter::new(compression, predictor), &path, &info, &expected).unwrap();

                let mut reader = GeoTiffReader::open(&path).unwrap();
                assert_eq!(reader.info().bands, bands);
                assert_eq!(reader.info().sample_type, sample_type);
                let mut line = vec![0.0; info.width];
                for row in 0..info.height {
                    for band in 0..bands {
                        reader.read_row(band, row, &mut line).unwrap();
                        assert_eq!(
                            line,
                            expected[band][row * info.width..(row + 1) * info.width],
                            "{} band {} row {}",
                            path.display(),
                            band,
                            row
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_predictor_only_on_compressed_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let rgb = RasterInfo::new(4, 3, 3, SampleType::U8);
        let slope = RasterInfo::new(4, 3, 1, SampleType::F32);

        let plain = dir.path().join("plain.tif");
        write_bands(&GeoTiffWriter::new(TiffCompression::None, Some(2)), &plain, &rgb, &gradient_bands(&rgb)).unwrap();
        assert_eq!(tiff_tag(&plain, Tag::Compression), Some(1));
        assert_eq!(tiff_tag(&plain, Tag::Predictor), None);

        let lzw = dir.path().join("lzw.tif");
        write_bands(&GeoTiffWriter::new(TiffCompression::Lzw, Some(2)), &lzw, &rgb, &gradient_bands(&rgb)).unwrap();
        assert_eq!(tiff_tag(&lzw, Tag::Compression), Some(5));
        assert_eq!(tiff_tag(&lzw, Tag::Predictor), Some(2));

        let deflate = dir.path().join("deflate.tif");
        write_bands(&GeoTiffWriter::new(TiffCompression::DeflateBest, Some(2)), &deflate, &slope, &gradient_bands(&slope)).unwrap();
        assert_eq!(tiff_tag(&deflate, Tag::Compression), Some(8));
        assert_eq!(tiff_tag(&deflate, Tag::Predictor), None);
    }

    #[test]
    fn test_compression_shrinks_flat_raster() {
        let dir = tempfile::tempdir().unwrap();
        let info = RasterInfo::new(256, 16, 3, SampleType::U8);
        let bands = vec![vec![200.0; 256 * 16]; 3];

        let plain = dir.path().join("plain.tif");
        let lzw = dir.path().join("lzw.tif");
        write_bands(&GeoTiffWriter::new(TiffCompression::None, None), &plain, &info, &bands).unwrap();
        write_bands(&GeoTiffWriter::default(), &lzw, &info, &bands).unwrap();

        let plain_len = std::fs::metadata(&plain).unwrap().len();
        let lzw_len = std::fs::metadata(&lzw).unwrap().len();
        assert!(plain_len > (256 * 16 * 3) as u64);
        assert!(lzw_len * 4 < plain_len, "lzw {} vs plain {}", lzw_len, plain_len);
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.tif");
        let info = RasterInfo::new(2, 2, 3, SampleType::U8);

        let result = GeoTiffWriter::default().write_raster(&path, &info, &mut |sink: &mut dyn RowSink| {
            for band in 0..3 {
                sink.write_row(band, 0, &[1.0, 2.0])?;
            }
            Err(TopoError::OutputWriteError("disk full".to_string()))
        });

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_unsupported_output_band_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.tif");
        let info = RasterInfo::new(2, 2, 2, SampleType::U8);

        let result = GeoTiffWriter::default().write_raster(&path, &info, &mut |_sink: &mut dyn RowSink| Ok(()));

        assert!(matches!(result, Err(TopoError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_missing_geotiff() {
        let result = GeoTiffReader::open("/nonexistent/dem_CR.tif");
        assert!(matches!(result, Err(TopoError::InputReadError(_))));
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-9999\0"), Some(-9999.0));
        assert_eq!(parse_nodata(" 0 "), Some(0.0));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert!(parse_nodata("-nan").unwrap().is_nan());
        assert_eq!(parse_nodata("none"), None);
    }

    #[test]
    fn test_nan_nodata_matches_nan() {
        let info = RasterInfo::new(1, 1, 1, SampleType::F32).with_nodata(Some(f64::NAN));
        assert!(info.is_nodata(f64::NAN));
        assert!(!info.is_nodata(0.0));

        let info = RasterInfo::new(1, 1, 1, SampleType::F32);
        assert!(!info.is_nodata(0.0));
    }

    #[test]
    fn test_pixel_area() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0002777, -0.0002777);
        assert!((gt.pixel_area() - 0.0002777 * 0.0002777).abs() < 1e-18);
    }
}
