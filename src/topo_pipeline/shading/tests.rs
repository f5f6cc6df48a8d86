#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::topo_pipeline::common::error::TopoError;
    use crate::topo_pipeline::raster::{
        GeoTransform, MemoryRaster, MemorySource, MemoryWriter, RasterInfo, SampleType,
    };
    use crate::topo_pipeline::shading::{
        ShadeBlend, WaterBurn, blend_slope_hillshade, burn_water, slope_water_mask,
    };

    const ARC_SECOND: f64 = 1.0 / 3600.0;

    fn single_band(width: usize, height: usize, nodata: Option<f64>, data: Vec<f64>) -> MemoryRaster {
        let info = RasterInfo::new(width, height, 1, SampleType::F32)
            .with_nodata(nodata)
            .with_geotransform(Some(GeoTransform::north_up(
                -105.0,
                40.0,
                ARC_SECOND,
                -ARC_SECOND,
            )));
        MemoryRaster::from_bands(info, vec![data]).unwrap()
    }

    fn mask(width: usize, rows: &[&str], geotransform: Option<GeoTransform>) -> MemoryRaster {
        let data = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| if c == '#' { 1.0 } else { 0.0 }))
            .collect();
        let info = RasterInfo::new(width, rows.len(), 1, SampleType::U8)
            .with_nodata(Some(0.0))
            .with_geotransform(geotransform);
        MemoryRaster::from_bands(info, vec![data]).unwrap()
    }

    fn topo(width: usize, height: usize, bands: usize) -> MemoryRaster {
        let info = RasterInfo::new(width, height, bands, SampleType::U8);
        let data = (0..bands).map(|b| vec![(10 + b * 20) as f64; width * height]).collect();
        MemoryRaster::from_bands(info, data).unwrap()
    }

    fn is_water_pixel(raster: &MemoryRaster, x: usize, y: usize) -> bool {
        raster.pixel(0, x, y) == 35.0 && raster.pixel(1, x, y) == 170.0 && raster.pixel(2, x, y) == 181.0
    }

    fn burn_by_pixel_count(min_pixels: f64) -> WaterBurn {
        WaterBurn {
            min_area: min_pixels,
            ..WaterBurn::default()
        }
    }

    #[test]
    fn test_defaults() {
        let blend = ShadeBlend::default();
        assert_eq!(blend.slope_weight, 0.7);
        assert_eq!(blend.hillshade_weight, 0.3);
        assert_eq!(blend.full_scale_slope, 90.0);
        assert_eq!(blend.offset, 70.0);

        let burn = WaterBurn::default();
        assert_eq!(burn.color, [35, 170, 181]);
        assert_eq!(burn.min_area, 0.0000009);
        assert!(burn.enabled);
    }

    #[test]
    fn test_blend_formula() {
        let blend = ShadeBlend::default();
        assert!((blend.apply(0.0, 0.0) - 70.0).abs() < 1e-9);
        assert!((blend.apply(90.0, 0.0) - (255.0 * 0.7 + 70.0)).abs() < 1e-9);
        assert!((blend.apply(45.0, 200.0) - (127.5 * 0.7 + 60.0 + 70.0)).abs() < 1e-9);
    }

    #[test]
    fn test_blend_raster_keeps_slope_geometry() {
        let slope = single_band(2, 2, Some(-9999.0), vec![0.0, 90.0, -9999.0, 45.0]);
        let hillshade = single_band(2, 2, Some(0.0), vec![100.0, 0.0, 181.0, 200.0]);
        let expected_geometry = slope.info().geotransform;

        let source = MemorySource::new()
            .with("dem_SL.tif", slope)
            .with("dem_HS.tif", hillshade);
        let writer = MemoryWriter::new();

        blend_slope_hillshade(
            &source,
            &writer,
            Path::new("dem_SL.tif"),
            Path::new("dem_HS.tif"),
            Path::new("dem_SL_HS.tif"),
            &ShadeBlend::default(),
        )
        .unwrap();

        let out = writer.get(Path::new("dem_SL_HS.tif")).unwrap();
        assert_eq!(out.info().sample_type, SampleType::F32);
        assert_eq!(out.info().nodata, Some(-9999.0));
        assert_eq!(out.info().geotransform, expected_geometry);

        assert!((out.pixel(0, 0, 0) - 100.0).abs() < 1e-9);
        // Hillshade no-data wins over a valid slope.
        assert_eq!(out.pixel(0, 1, 0), -9999.0);
        assert_eq!(out.pixel(0, 0, 1), -9999.0);
        assert!((out.pixel(0, 1, 1) - (127.5 * 0.7 + 60.0 + 70.0)).abs() < 1e-9);
    }

    #[test]
    fn test_blend_rejects_different_grids() {
        let source = MemorySource::new()
            .with("a.tif", single_band(2, 2, None, vec![0.0; 4]))
            .with("b.tif", single_band(3, 2, None, vec![0.0; 6]));
        let writer = MemoryWriter::new();

        let result = blend_slope_hillshade(
            &source,
            &writer,
            Path::new("a.tif"),
            Path::new("b.tif"),
            Path::new("out.tif"),
            &ShadeBlend::default(),
        );

        assert!(matches!(result, Err(TopoError::GridMismatch(_))));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_water_mask_marks_flat_pixels() {
        let slope = single_band(4, 1, Some(-9999.0), vec![0.0, 0.5, -9999.0, 0.0]);
        let source = MemorySource::new().with("dem_SL.tif", slope);
        let writer = MemoryWriter::new();

        slope_water_mask(&source, &writer, Path::new("dem_SL.tif"), Path::new("dem_SL_Water.tif")).unwrap();

        let out = writer.get(Path::new("dem_SL_Water.tif")).unwrap();
        assert_eq!(out.info().sample_type, SampleType::U8);
        assert_eq!(out.info().nodata, Some(0.0));
        assert_eq!(out.band(0), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_small_regions_dropped_large_kept() {
        let rows = [
            "##....",
            "##...#",
            "......",
            "#.....",
        ];
        let source = MemorySource::new()
            .with("topo.tif", topo(6, 4, 3))
            .with("water.tif", mask(6, &rows, None));
        let writer = MemoryWriter::new();

        let burned = burn_water(
            &source,
            &writer,
            Path::new("topo.tif"),
            Path::new("water.tif"),
            Path::new("out.tif"),
            &burn_by_pixel_count(2.0),
        )
        .unwrap();

        assert_eq!(burned, 1);
        let out = writer.get(Path::new("out.tif")).unwrap();
        assert!(is_water_pixel(&out, 0, 0));
        assert!(is_water_pixel(&out, 1, 1));
        assert!(!is_water_pixel(&out, 5, 1));
        assert!(!is_water_pixel(&out, 0, 3));
        assert_eq!(out.pixel(0, 3, 0), 10.0);
    }

    #[test]
    fn test_regions_joined_below_are_one_region() {
        // Two arms that only meet on the last row must count as a single region.
        let rows = [
            "#...#",
            "#...#",
            "#####",
        ];
        let source = MemorySource::new()
            .with("topo.tif", topo(5, 3, 3))
            .with("water.tif", mask(5, &rows, None));
        let writer = MemoryWriter::new();

        let burned = burn_water(
            &source,
            &writer,
            Path::new("topo.tif"),
            Path::new("water.tif"),
            Path::new("out.tif"),
            &burn_by_pixel_count(8.0),
        )
        .unwrap();

        assert_eq!(burned, 1);
        let out = writer.get(Path::new("out.tif")).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                assert_eq!(is_water_pixel(&out, x, y), c == '#', "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_diagonal_pixels_are_separate_regions() {
        let rows = [
            "#.",
            ".#",
        ];
        let source = MemorySource::new()
            .with("topo.tif", topo(2, 2, 3))
            .with("water.tif", mask(2, &rows, None));
        let writer = MemoryWriter::new();

        let burned = burn_water(
            &source,
            &writer,
            Path::new("topo.tif"),
            Path::new("water.tif"),
            Path::new("out.tif"),
            &burn_by_pixel_count(1.0),
        )
        .unwrap();

        assert_eq!(burned, 0);
        let out = writer.get(Path::new("out.tif")).unwrap();
        assert!(!is_water_pixel(&out, 0, 0));
        assert!(!is_water_pixel(&out, 1, 1));
    }

    #[test]
    fn test_area_uses_geotransform() {
        // With 3 arc-second pixels nine exceed the default threshold and one does not.
        let gt = Some(GeoTransform::north_up(0.0, 0.0, 3.0 * ARC_SECOND, -3.0 * ARC_SECOND));
        let rows = [
            "###....#",
            "###.....",
            "###.....",
        ];
        let source = MemorySource::new()
            .with("topo.tif", topo(8, 3, 4))
            .with("water.tif", mask(8, &rows, gt));
        let writer = MemoryWriter::new();

        let burned = burn_water(
            &source,
            &writer,
            Path::new("topo.tif"),
            Path::new("water.tif"),
            Path::new("out.tif"),
            &WaterBurn::default(),
        )
        .unwrap();

        assert_eq!(burned, 1);
        let out = writer.get(Path::new("out.tif")).unwrap();
        assert!(is_water_pixel(&out, 2, 2));
        assert!(!is_water_pixel(&out, 7, 0));
        // Alpha untouched.
        assert!(out.band(3).iter().all(|&a| a == 70.0));
    }

    #[test]
    fn test_burn_requires_color_bands() {
        let source = MemorySource::new()
            .with("topo.tif", topo(2, 1, 1))
            .with("water.tif", mask(2, &["##"], None));

        let result = burn_water(
            &source,
            &MemoryWriter::new(),
            Path::new("topo.tif"),
            Path::new("water.tif"),
            Path::new("out.tif"),
            &WaterBurn::default(),
        );

        assert!(matches!(result, Err(TopoError::InsufficientBands(1))));
    }
}
