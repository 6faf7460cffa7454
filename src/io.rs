use crate::error::{GlacierError, Result};
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, RasterBand};
use gdal::{Dataset, DriverManager, Metadata};
use image::ColorType;
use log::{debug, info, warn};
use ndarray::{stack, Array2, Array3, ArrayView2, ArrayView3, Axis};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl RasterMetadata {
    /// Pixel resolution as `(pixel_width, pixel_height)` in CRS units.
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width, self.pixel_height)
    }
}

/// Open a dataset, reporting a missing file before GDAL gets to it.
pub fn open_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(GlacierError::ResourceNotFound(path.display().to_string()));
    }
    info!("Opening raster: {}", path.display());
    Ok(Dataset::open(path)?)
}

/// Extract metadata from a dataset without reading all data
pub fn extract_metadata_from_dataset(dataset: &Dataset) -> Result<RasterMetadata> {
    let rasterband: RasterBand = dataset.rasterband(1)?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(GlacierError::InvalidDimensions(width, height));
    }

    let nodata = rasterband.no_data_value();
    let geotransform = dataset.geo_transform()?;
    let pixel_width = geotransform[1].abs();
    let pixel_height = geotransform[5].abs();

    if pixel_width <= 0.0 {
        return Err(GlacierError::InvalidPixelSize(pixel_width));
    }
    if pixel_height <= 0.0 {
        return Err(GlacierError::InvalidPixelSize(pixel_height));
    }

    Ok(RasterMetadata {
        width,
        height,
        band_count: dataset.raster_count() as usize,
        geotransform,
        projection: dataset.projection(),
        nodata,
        pixel_width,
        pixel_height,
    })
}

fn read_band_f32(dataset: &Dataset, band_index: usize, width: usize, height: usize) -> Result<Array2<f32>> {
    let rasterband = dataset.rasterband(band_index)?;
    let buffer = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
    let data_vec: Vec<f32> = buffer.into_iter().collect();
    Ok(Array2::from_shape_vec((height, width), data_vec)?)
}

/// Read every band of an image raster as `(height, width, bands)`.
pub fn read_image_raster(path: &Path) -> Result<(Array3<f32>, RasterMetadata)> {
    let dataset = open_dataset(path)?;
    let metadata = extract_metadata_from_dataset(&dataset)?;

    debug!(
        "Image raster: {}x{}, {} bands",
        metadata.width, metadata.height, metadata.band_count
    );

    let bands = (1..=metadata.band_count)
        .map(|band_index| read_band_f32(&dataset, band_index, metadata.width, metadata.height))
        .collect::<Result<Vec<_>>>()?;
    let views: Vec<ArrayView2<'_, f32>> = bands.iter().map(|b| b.view()).collect();
    let data = stack(Axis(2), &views)?;

    Ok((data, metadata))
}

/// Read band 1 of a label or mask raster.
pub fn read_mask_raster(path: &Path) -> Result<(Array2<u8>, RasterMetadata)> {
    let dataset = open_dataset(path)?;
    let metadata = extract_metadata_from_dataset(&dataset)?;

    let rasterband = dataset.rasterband(1)?;
    let buffer = rasterband.read_as::<u8>(
        (0, 0),
        (metadata.width, metadata.height),
        (metadata.width, metadata.height),
        None,
    )?;
    let data_vec: Vec<u8> = buffer.into_iter().collect();
    let data = Array2::from_shape_vec((metadata.height, metadata.width), data_vec)?;

    Ok((data, metadata))
}

/// Width and height must agree; a differing geotransform is only reported.
pub fn check_coregistered(image: &RasterMetadata, label: &RasterMetadata) -> Result<()> {
    if image.width != label.width || image.height != label.height {
        return Err(GlacierError::ShapeMismatch(
            image.width,
            image.height,
            label.width,
            label.height,
        ));
    }

    let same_transform = image
        .geotransform
        .iter()
        .zip(label.geotransform.iter())
        .all(|(a, b)| (a - b).abs() <= 1e-9 * a.abs().max(1.0));
    if !same_transform {
        warn!(
            "Geotransforms differ: image {:?}, label {:?}",
            image.geotransform, label.geotransform
        );
    }

    Ok(())
}

/// Create a single-band byte dataset with the given creation options
pub fn create_mask_dataset(path: &Path, metadata: &RasterMetadata, options: &[String]) -> Result<Dataset> {
    info!("Creating output dataset: {}", path.display());

    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let dataset = if options.is_empty() {
        driver.create_with_band_type::<u8, _>(path, metadata.width, metadata.height, 1)?
    } else {
        let mut gdal_options = CslStringList::new();
        for opt in options {
            gdal_options.add_string(opt)?;
        }

        driver.create_with_band_type_with_options::<u8, _>(
            path,
            metadata.width,
            metadata.height,
            1,
            &gdal_options,
        )?
    };

    Ok(dataset)
}

/// Write a classified mask with the georeferencing of its source image.
pub fn write_mask(
    path: &Path,
    mask: &Array2<u8>,
    metadata: &RasterMetadata,
    options: &[String],
) -> Result<()> {
    let (height, width) = mask.dim();
    if height != metadata.height || width != metadata.width {
        return Err(GlacierError::ShapeMismatch(
            metadata.width,
            metadata.height,
            width,
            height,
        ));
    }

    ensure_parent_dir(path)?;

    let mut dataset = create_mask_dataset(path, metadata, options)?;
    dataset.set_geo_transform(&metadata.geotransform)?;
    dataset.set_projection(&metadata.projection)?;

    let mut raster_band = dataset.rasterband(1)?;
    let mut buffer = Buffer::new((width, height), mask.iter().copied().collect());
    raster_band.write((0, 0), (width, height), &mut buffer)?;
    raster_band.set_description("glacier_mask")?;

    info!("Glacier mask saved to: {}", path.display());
    Ok(())
}

/// Create `dir` and its parents, naming `dir` on failure.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| GlacierError::Write {
        path: dir.display().to_string(),
        source,
    })
}

/// Create the directory an output file will land in.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// `patch_0007.png`: the shared name of an image/label patch pair.
pub fn patch_file_name(index: usize) -> String {
    format!("patch_{:04}.png", index)
}

/// `<prefix>_<year>_prediction.<ext>`
pub fn mask_file_name(prefix: &str, year: i32, ext: &str) -> String {
    format!("{}_{}_prediction.{}", prefix, year, ext)
}

pub fn mask_path(folder: &Path, prefix: &str, year: i32, ext: &str) -> PathBuf {
    folder.join(mask_file_name(prefix, year, ext))
}

fn png_color_type(bands: usize) -> Result<ColorType> {
    match bands {
        1 => Ok(ColorType::L8),
        2 => Ok(ColorType::La8),
        3 => Ok(ColorType::Rgb8),
        4 => Ok(ColorType::Rgba8),
        other => Err(GlacierError::UnsupportedBandCount(other)),
    }
}

/// Check up front that image tiles with `bands` bands can be written as PNG.
pub fn validate_png_bands(bands: usize) -> Result<()> {
    png_color_type(bands).map(|_| ())
}

/// Write a `(tile, tile, bands)` byte tile as PNG.
pub fn write_image_patch(path: &Path, tile: ArrayView3<'_, u8>) -> Result<()> {
    let (height, width, bands) = tile.dim();
    let color = png_color_type(bands)?;
    let data: Vec<u8> = tile.iter().copied().collect();
    save_png(path, &data, width, height, color)
}

/// Write a label tile as a 0 / 255 grayscale PNG.
pub fn write_label_patch(path: &Path, label: ArrayView2<'_, u8>) -> Result<()> {
    let (height, width) = label.dim();
    let data: Vec<u8> = label.iter().map(|&v| if v == 0 { 0 } else { 255 }).collect();
    save_png(path, &data, width, height, ColorType::L8)
}

fn save_png(path: &Path, data: &[u8], width: usize, height: usize, color: ColorType) -> Result<()> {
    image::save_buffer(path, data, width as u32, height as u32, color).map_err(|source| {
        GlacierError::ImageWrite {
            path: path.display().to_string(),
            source,
        }
    })
}
