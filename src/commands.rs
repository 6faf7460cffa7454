//! File-level glue for each subcommand: open inputs, run the in-memory
//! procedure, write outputs.

use crate::area::{area_series, write_area_csv_file};
use crate::classifier::{Classifier, TimeoutClassifier};
use crate::cli::{AreaArgs, PatchesArgs, PredictArgs};
use crate::error::{GlacierError, Result};
use crate::io;
use crate::model::IndexModel;
use crate::output::mask_dataset_options;
use crate::stitcher::stitch;
use crate::tiler::{tile_pairs, TilerConfig};
use log::{info, warn};
use std::time::Duration;

pub fn run_patches(args: &PatchesArgs) -> Result<usize> {
    let config = TilerConfig {
        tile_size: args.tile_size,
        stride: args.stride.unwrap_or(args.tile_size),
        include_empty: args.include_empty,
    };

    let (image, image_meta) = io::read_image_raster(&args.image)?;
    let (label, label_meta) = io::read_mask_raster(&args.mask)?;
    io::check_coregistered(&image_meta, &label_meta)?;
    io::validate_png_bands(image_meta.band_count)?;

    info!(
        "Image size: {}x{}, {} bands",
        image_meta.width, image_meta.height, image_meta.band_count
    );

    io::ensure_dir(&args.image_dir)?;
    io::ensure_dir(&args.mask_dir)?;

    let pairs = tile_pairs(image.view(), label.view(), config)?;
    info!(
        "Tile grid: {} candidate patches of {}x{} (stride {})",
        pairs.grid().len(),
        pairs.grid().tile_size(),
        pairs.grid().tile_size(),
        pairs.grid().stride()
    );

    let mut written = 0;
    for pair in pairs {
        let pair = pair?;
        let name = io::patch_file_name(pair.index);
        io::write_image_patch(&args.image_dir.join(&name), pair.image.view())?;
        io::write_label_patch(&args.mask_dir.join(&name), pair.label.view())?;
        written += 1;
    }

    info!(
        "{} patches saved to '{}' and '{}'",
        written,
        args.image_dir.display(),
        args.mask_dir.display()
    );
    Ok(written)
}

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    // Fail on bad output settings and a bad model before reading any pixels.
    let options = mask_dataset_options(&args.compress, args.block_size)?;
    let model = IndexModel::load(&args.model)?;

    let classifier: Box<dyn Classifier> = match args.timeout_secs {
        Some(secs) => {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(GlacierError::InvalidTimeout(secs));
            }
            info!("Per-tile classifier timeout: {} s", secs);
            Box::new(TimeoutClassifier::new(model, Duration::from_secs_f64(secs)))
        }
        None => Box::new(model),
    };

    let (image, metadata) = io::read_image_raster(&args.input)?;
    info!("Image size: width={}, height={}", metadata.width, metadata.height);
    if let Some(nodata) = metadata.nodata {
        warn!("Input nodata value {} is classified like any other pixel", nodata);
    }

    let (mask, summary) = stitch(image.view(), args.tile_size, classifier.as_ref())?;
    if summary.skipped > 0 {
        info!("{} tiles were skipped", summary.skipped);
    }

    io::write_mask(&args.output, &mask, &metadata, &options)?;
    Ok(())
}

pub fn run_area(args: &AreaArgs) -> Result<()> {
    info!(
        "Computing glacier area for {} years from {}",
        args.years.len(),
        args.folder.display()
    );

    let records = area_series(&args.folder, &args.prefix, &args.ext, &args.years)?;
    write_area_csv_file(&args.output, &records)?;
    Ok(())
}
