use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::topo_pipeline::common::error::{Result, TopoError};

/// Rasters produced while converting one DEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    ColorRelief,
    Hillshade,
    Slope,
    SlopeHillshade,
    SlopeWater,
    Topo,
}

impl Product {
    /// Everything except the final topo image.
    pub const INTERMEDIATES: [Product; 5] = [
        Product::ColorRelief,
        Product::Hillshade,
        Product::Slope,
        Product::SlopeHillshade,
        Product::SlopeWater,
    ];

    pub const ALL: [Product; 6] = [
        Product::ColorRelief,
        Product::Hillshade,
        Product::Slope,
        Product::SlopeHillshade,
        Product::SlopeWater,
        Product::Topo,
    ];

    /// Suffix appended to the DEM file stem.
    pub fn tag(self) -> &'static str {
        match self {
            Product::ColorRelief => "_CR",
            Product::Hillshade => "_HS",
            Product::Slope => "_SL",
            Product::SlopeHillshade => "_SL_HS",
            Product::SlopeWater => "_SL_Water",
            Product::Topo => "_Topo",
        }
    }
}

/// `<folder>/<dem stem><tag>.tif`
pub fn product_path(folder: &Path, dem: &Path, product: Product) -> PathBuf {
    let stem = dem.file_stem().unwrap_or_default().to_string_lossy();
    folder.join(format!("{}{}.tif", stem, product.tag()))
}

fn is_product(path: &Path) -> bool {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    Product::ALL.iter().any(|product| stem.ends_with(product.tag()))
}

/// Regular files in `folder` with the given extension, sorted by path.
///
/// The extension is matched case-sensitively, with or without a leading dot. When
/// it is `tif`, rasters this pipeline produces are skipped.
pub fn discover_dems(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let entries = fs::read_dir(folder).map_err(|e| {
        TopoError::InputReadError(format!("{}: {}", folder.display(), e))
    })?;

    let mut dems = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension() != Some(OsStr::new(extension)) {
            continue;
        }
        if extension == "tif" && is_product(&path) {
            debug!(path = %path.display(), "Skipping pipeline product");
            continue;
        }
        dems.push(path);
    }

    dems.sort();
    Ok(dems)
}
