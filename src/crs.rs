use gdal::spatial_ref::SpatialRef;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearUnits {
    Metres,
    Degrees,
    Other(f64), // Projected, metres per unit
    Unknown,
}

impl LinearUnits {
    pub fn is_metric(&self) -> bool {
        matches!(self, LinearUnits::Metres)
    }
}

/// Classify the unit of the pixel resolution from the projection WKT.
pub fn detect_linear_units(projection_wkt: &str) -> LinearUnits {
    if projection_wkt.trim().is_empty() {
        return LinearUnits::Unknown;
    }

    let spatial_ref = match SpatialRef::from_wkt(projection_wkt) {
        Ok(sr) => sr,
        Err(e) => {
            debug!("Failed to parse projection WKT: {}", e);
            return LinearUnits::Unknown;
        }
    };

    if spatial_ref.is_geographic() {
        return LinearUnits::Degrees;
    }

    if spatial_ref.is_projected() {
        let linear_units = spatial_ref.linear_units();
        if (linear_units - 1.0).abs() < 0.01 {
            return LinearUnits::Metres;
        }
        return LinearUnits::Other(linear_units);
    }

    LinearUnits::Unknown
}

/// Warn when areas computed from this projection's pixel size are not km².
pub fn warn_if_not_metric(projection_wkt: &str, source: &str) -> LinearUnits {
    let units = detect_linear_units(projection_wkt);
    if units.is_metric() {
        debug!("{}: projected CRS in metres", source);
        return units;
    }

    match units {
        LinearUnits::Degrees => warn!(
            "{}: geographic CRS, pixel size is in degrees and areas will not be km²",
            source
        ),
        LinearUnits::Other(factor) => warn!(
            "{}: projected CRS with non-metre units ({:.6} m/unit), areas will not be km²",
            source, factor
        ),
        _ => warn!("{}: unknown CRS, assuming pixel size in metres", source),
    }
    units
}
