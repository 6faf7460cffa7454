//! Scratch directories and small GeoTIFF fixtures for GDAL-backed tests.

use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};

/// 10 m pixels, north-up, UTM 33N origin.
pub const UTM_10M: [f64; 6] = [500000.0, 10.0, 0.0, 6800000.0, 0.0, -10.0];

/// A fresh, empty directory unique to this process and `name`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glacier_tiles_{}_{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn utm_wkt() -> String {
    SpatialRef::from_epsg(32633).unwrap().to_wkt().unwrap()
}

/// Write one GeoTIFF band per array, all of the same shape. The dataset is
/// flushed when the returned handle drops.
pub fn write_geotiff<T: GdalType + Copy>(
    path: &Path,
    bands: &[Array2<T>],
    geotransform: [f64; 6],
    projection: &str,
) -> Dataset {
    let (height, width) = bands[0].dim();
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<T, _>(path, width, height, bands.len())
        .unwrap();
    dataset.set_geo_transform(&geotransform).unwrap();
    dataset.set_projection(projection).unwrap();

    for (i, band) in bands.iter().enumerate() {
        let mut raster_band = dataset.rasterband(i + 1).unwrap();
        let mut buffer = Buffer::new((width, height), band.iter().copied().collect());
        raster_band.write((0, 0), (width, height), &mut buffer).unwrap();
    }
    dataset
}
