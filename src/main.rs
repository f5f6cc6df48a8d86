use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use dem_to_topo::logger;
use dem_to_topo::topo_pipeline::{
    BatchConfig, GdalDemProcessor, HsvMergePipeline, MergeConfig, TiffCompression, TopoBatch,
    WaterBurn,
};

#[derive(Parser)]
#[command(name = "dem_to_topo")]
#[command(version, about = "Turn DEM tiles into shaded topo map images", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a color raster with an intensity raster in HSV space
    Merge {
        /// Single-band intensity raster (e.g. blended slope/hillshade)
        intensity: PathBuf,
        /// RGB or RGBA color relief raster
        color: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        #[command(flatten)]
        output_options: OutputOptions,
    },
    /// Convert every DEM in a folder into a topo image
    Batch {
        /// Folder holding the DEM files
        folder: PathBuf,
        /// Elevation to color table for the color relief
        color_table: PathBuf,
        /// DEM file extension
        #[arg(default_value = "bil")]
        extension: String,
        /// Keep the intermediate rasters
        #[arg(long)]
        keep_intermediates: bool,
        /// Skip water detection
        #[arg(long)]
        no_water: bool,
        /// Smallest water region area kept, in squared map units
        #[arg(long, default_value_t = WaterBurn::default().min_area)]
        min_water_area: f64,
        /// gdaldem executable
        #[arg(long, default_value = "gdaldem")]
        gdaldem: PathBuf,
        #[command(flatten)]
        output_options: OutputOptions,
    },
}

#[derive(clap::Args)]
struct OutputOptions {
    /// Output compression
    #[arg(short, long, value_enum, default_value_t = Compression::Lzw)]
    compression: Compression,
    /// Merge row blocks in parallel
    #[arg(short, long)]
    parallel: bool,
    /// Rows per parallel block
    #[arg(long, default_value_t = 64)]
    rows_per_block: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<Compression> for TiffCompression {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::DeflateFast => TiffCompression::DeflateFast,
            Compression::Deflate => TiffCompression::DeflateBalanced,
            Compression::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

impl OutputOptions {
    fn merge_config(&self) -> MergeConfig {
        MergeConfig::builder()
            .compression(TiffCompression::from(self.compression))
            .predictor(Some(2))
            .parallel(self.parallel)
            .rows_per_block(self.rows_per_block)
            .build()
    }
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Merge {
            intensity,
            color,
            output,
            output_options,
        } => {
            let config = output_options.merge_config();
            info!("Compression: {:?}", config.compression);

            let pipeline = HsvMergePipeline::new(config);
            let written = pipeline
                .merge(&intensity, &color, &output)
                .with_context(|| format!("merging {} into {}", color.display(), output.display()))?;

            info!("Wrote {}", written.display());
            Ok(true)
        }
        Commands::Batch {
            folder,
            color_table,
            extension,
            keep_intermediates,
            no_water,
            min_water_area,
            gdaldem,
            output_options,
        } => {
            let config = BatchConfig::builder()
                .color_table(color_table)
                .extension(extension)
                .keep_intermediates(keep_intermediates)
                .water(WaterBurn {
                    min_area: min_water_area,
                    enabled: !no_water,
                    ..WaterBurn::default()
                })
                .merge(output_options.merge_config())
                .build();

            let batch = TopoBatch::with_processor(GdalDemProcessor::with_program(gdaldem), config);
            let report = batch
                .process_folder(&folder)
                .with_context(|| format!("processing {}", folder.display()))?;

            for failure in &report.failed {
                error!("{}: {}", failure.dem.display(), failure.error);
            }
            info!(
                "Completed: {} of {} DEMs converted",
                report.succeeded.len(),
                report.total()
            );
            Ok(report.is_success())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    info!("Starting dem_to_topo...");

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
