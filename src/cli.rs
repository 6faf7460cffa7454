use crate::output::{DEFAULT_BLOCK_SIZE, DEFAULT_COMPRESSION};
use crate::tiler::DEFAULT_TILE_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "glacier-tiles")]
#[command(about = "Patch generation, tiled glacier inference and glacier area per year")]
#[command(version)]
pub struct Args {
    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cut an image raster and its label raster into paired PNG training patches
    Patches(PatchesArgs),
    /// Classify a full raster tile by tile and write a 0/255 glacier mask
    Predict(PredictArgs),
    /// Compute glacier area per year from prediction masks and write a CSV
    Area(AreaArgs),
}

#[derive(clap::Args, Debug)]
pub struct PatchesArgs {
    /// Input image GeoTIFF
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    /// Label GeoTIFF co-registered with the image (0 = background)
    #[arg(short, long, value_name = "FILE")]
    pub mask: PathBuf,

    /// Directory for image patches
    #[arg(long, value_name = "DIR", default_value = "patches/images")]
    pub image_dir: PathBuf,

    /// Directory for label patches
    #[arg(long, value_name = "DIR", default_value = "patches/masks")]
    pub mask_dir: PathBuf,

    /// Patch edge length in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: usize,

    /// Step between patch origins (default: tile size)
    #[arg(long, value_name = "PIXELS")]
    pub stride: Option<usize>,

    /// Keep patches whose label window is all background
    #[arg(long)]
    pub include_empty: bool,
}

#[derive(clap::Args, Debug)]
pub struct PredictArgs {
    /// Input image GeoTIFF
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Classifier model file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub model: PathBuf,

    /// Output mask GeoTIFF
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Tile edge length in pixels
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_TILE_SIZE)]
    pub tile_size: usize,

    /// Fail if a single tile prediction takes longer than this
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<f64>,

    /// Output compression (LZW, DEFLATE, ZSTD, PACKBITS, NONE)
    #[arg(long, default_value = DEFAULT_COMPRESSION)]
    pub compress: String,

    /// Output GeoTIFF block size (multiple of 16)
    #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,
}

#[derive(clap::Args, Debug)]
pub struct AreaArgs {
    /// Folder containing the prediction masks
    #[arg(short, long, value_name = "DIR", default_value = "full_image_inference")]
    pub folder: PathBuf,

    /// Years to process, in output order (e.g. 2016,2017,2018)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub years: Vec<i32>,

    /// Mask file prefix, as in <prefix>_<year>_prediction.<ext>
    #[arg(long, default_value = "glacier")]
    pub prefix: String,

    /// Mask file extension
    #[arg(long, default_value = "tif")]
    pub ext: String,

    /// Output CSV path
    #[arg(short, long, value_name = "FILE", default_value = "glacier_area_by_year.csv")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_area_years() {
        let args = Args::parse_from(["glacier-tiles", "area", "--years", "2016,2017,2024"]);
        match args.command {
            Command::Area(area) => {
                assert_eq!(area.years, vec![2016, 2017, 2024]);
                assert_eq!(area.prefix, "glacier");
                assert_eq!(area.output, PathBuf::from("glacier_area_by_year.csv"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_patches_defaults() {
        let args = Args::parse_from([
            "glacier-tiles",
            "-v",
            "patches",
            "--image",
            "rgb.tif",
            "--mask",
            "mask.tif",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Patches(p) => {
                assert_eq!(p.tile_size, 128);
                assert_eq!(p.stride, None);
                assert!(!p.include_empty);
                assert_eq!(p.image_dir, PathBuf::from("patches/images"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_predict_defaults() {
        let args = Args::parse_from([
            "glacier-tiles",
            "predict",
            "-i",
            "scene.tif",
            "-m",
            "model.json",
            "-o",
            "out/mask.tif",
        ]);
        match args.command {
            Command::Predict(p) => {
                assert_eq!(p.tile_size, DEFAULT_TILE_SIZE);
                assert_eq!(p.compress, DEFAULT_COMPRESSION);
                assert_eq!(p.block_size, DEFAULT_BLOCK_SIZE);
                assert_eq!(p.timeout_secs, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
