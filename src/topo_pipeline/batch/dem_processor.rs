use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use crate::topo_pipeline::common::error::{Result, TopoError};

/// Produces the DEM derivatives the pipeline starts from. Every output is a
/// single GeoTIFF at the given path.
pub trait DemProcessor {
    /// RGB(A) color relief from a color table of elevation/color pairs.
    fn color_relief(&self, dem: &Path, color_table: &Path, output: &Path) -> Result<()>;

    /// Single-band 8-bit hillshade.
    fn hillshade(&self, dem: &Path, output: &Path) -> Result<()>;

    /// Single-band slope in degrees.
    fn slope(&self, dem: &Path, output: &Path) -> Result<()>;
}

/// Horizontal to vertical unit ratio for DEMs in geographic degrees with elevations
/// in meters.
const DEGREE_SCALE: &str = "111120";
const HILLSHADE_Z_FACTOR: &str = "5";
const HILLSHADE_AZIMUTH: &str = "90";

/// Runs the `gdaldem` command line tool.
#[derive(Debug, Clone)]
pub struct GdalDemProcessor {
    program: PathBuf,
}

impl Default for GdalDemProcessor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gdaldem"),
        }
    }
}

impl GdalDemProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program` instead of `gdaldem` from `PATH`.
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub(crate) fn color_relief_args(dem: &Path, color_table: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["color-relief".into(), "-of".into(), "GTiff".into()];
        args.extend([dem, color_table, output].map(OsString::from));
        args
    }

    pub(crate) fn hillshade_args(dem: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "hillshade",
            "-of",
            "GTiff",
            "-z",
            HILLSHADE_Z_FACTOR,
            "-s",
            DEGREE_SCALE,
            "-az",
            HILLSHADE_AZIMUTH,
            "-compute_edges",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.extend([dem, output].map(OsString::from));
        args
    }

    pub(crate) fn slope_args(dem: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["slope", "-of", "GTiff", "-s", DEGREE_SCALE, "-compute_edges"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.extend([dem, output].map(OsString::from));
        args
    }

    #[instrument(skip_all, fields(mode = ?args.first()))]
    fn run(&self, args: Vec<OsString>) -> Result<()> {
        debug!(program = %self.program.display(), ?args, "Running");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| TopoError::ExternalTool(format!("{}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TopoError::ExternalTool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl DemProcessor for GdalDemProcessor {
    fn color_relief(&self, dem: &Path, color_table: &Path, output: &Path) -> Result<()> {
        self.run(Self::color_relief_args(dem, color_table, output))
    }

    fn hillshade(&self, dem: &Path, output: &Path) -> Result<()> {
        self.run(Self::hillshade_args(dem, output))
    }

    fn slope(&self, dem: &Path, output: &Path) -> Result<()> {
        self.run(Self::slope_args(dem, output))
    }
}
