use crate::crs::warn_if_not_metric;
use crate::error::{GlacierError, Result};
use crate::io::{ensure_parent_dir, mask_path, read_mask_raster};
use crate::stitcher::GLACIER_CODE;
use log::info;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const SQUARE_METRES_PER_KM2: f64 = 1_000_000.0;

/// Glacier area of one year's mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Glacier_Area_km2")]
    pub area_km2: f64,
}

/// `count(pixel == 255) × pixel_width × pixel_height / 1e6`, rounded to
/// three decimals. Pixel sizes are in metres.
pub fn glacier_area_km2(mask: ArrayView2<'_, u8>, pixel_width: f64, pixel_height: f64) -> f64 {
    let glacier_pixels = mask.iter().filter(|&&v| v == GLACIER_CODE).count();
    let area = glacier_pixels as f64 * pixel_width * pixel_height / SQUARE_METRES_PER_KM2;
    round_to_millis(area)
}

/// Round on the exact decimal expansion of `value`, so `0.0045` (stored just
/// below the midpoint) becomes `0.004`.
fn round_to_millis(value: f64) -> f64 {
    format!("{:.3}", value).parse().unwrap_or(value)
}

/// Load `<prefix>_<year>_prediction.<ext>` from `folder` for each year, in
/// the given order.
pub fn area_series(folder: &Path, prefix: &str, ext: &str, years: &[i32]) -> Result<Vec<AreaRecord>> {
    let mut records = Vec::with_capacity(years.len());

    for &year in years {
        let path = mask_path(folder, prefix, year, ext);
        let (mask, metadata) = read_mask_raster(&path)?;
        warn_if_not_metric(&metadata.projection, &path.display().to_string());

        let (pixel_width, pixel_height) = metadata.resolution();
        let area_km2 = glacier_area_km2(mask.view(), pixel_width, pixel_height);
        info!("{}: {} km²", year, area_km2);

        records.push(AreaRecord { year, area_km2 });
    }

    Ok(records)
}

/// Write `Year,Glacier_Area_km2` rows.
pub fn write_area_csv<W: Write>(writer: W, records: &[AreaRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_area_csv_file(path: &Path, records: &[AreaRecord]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|source| GlacierError::Write {
        path: path.display().to_string(),
        source,
    })?;
    write_area_csv(BufWriter::new(file), records).map_err(|e| match e {
        GlacierError::Csv(source) => GlacierError::CsvWrite {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;
    info!("Results saved to {}", path.display());
    Ok(())
}
