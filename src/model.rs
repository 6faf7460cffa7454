//! Band-index classifier loaded from a JSON model file.
//!
//! ```json
//! {
//!   "input_bands": 3,
//!   "index": { "kind": "normalized_difference", "band_a": 1, "band_b": 0 },
//!   "threshold": 0.1,
//!   "sharpness": 12.0
//! }
//! ```
//!
//! Band numbers are zero-based positions in the tile's band axis.

use crate::classifier::Classifier;
use crate::error::{GlacierError, Result};
use log::info;
use ndarray::{Array2, ArrayView1, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn default_sharpness() -> f32 {
    10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpectralIndex {
    /// `(a - b) / (a + b)`, e.g. NDSI with green and SWIR.
    NormalizedDifference { band_a: usize, band_b: usize },
    /// Mean over all bands.
    Brightness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexModel {
    pub input_bands: usize,
    pub index: SpectralIndex,
    pub threshold: f32,
    #[serde(default = "default_sharpness")]
    pub sharpness: f32,
}

impl IndexModel {
    /// Load and validate a model file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GlacierError::ResourceNotFound(path.display().to_string()));
        }

        info!("Loading model from: {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let model: IndexModel =
            serde_json::from_reader(reader).map_err(|source| GlacierError::ModelFormat {
                path: path.display().to_string(),
                source,
            })?;

        model.validate()?;
        info!("Model loaded: {:?}, threshold {}", model.index, model.threshold);
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_bands == 0 {
            return Err(GlacierError::InvalidBandCount {
                expected: 1,
                actual: 0,
            });
        }
        if let SpectralIndex::NormalizedDifference { band_a, band_b } = self.index {
            for band in [band_a, band_b] {
                if band >= self.input_bands {
                    return Err(GlacierError::BandOutOfRange {
                        band,
                        bands: self.input_bands,
                    });
                }
            }
        }
        Ok(())
    }

    fn index_value(&self, pixel: ArrayView1<'_, f32>) -> f32 {
        match self.index {
            SpectralIndex::NormalizedDifference { band_a, band_b } => {
                let a = pixel[band_a];
                let b = pixel[band_b];
                let sum = a + b;
                if sum.abs() > 1e-6 {
                    ((a - b) / sum).clamp(-1.0, 1.0)
                } else {
                    // Dark pixel, no signal either way.
                    -1.0
                }
            }
            SpectralIndex::Brightness => pixel.mean().unwrap_or(0.0),
        }
    }
}

impl Classifier for IndexModel {
    fn input_bands(&self) -> usize {
        self.input_bands
    }

    fn predict(&self, tile: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let bands = tile.dim().2;
        if bands != self.input_bands {
            return Err(GlacierError::InvalidBandCount {
                expected: self.input_bands,
                actual: bands,
            });
        }

        Ok(tile.map_axis(Axis(2), |pixel| {
            let index = self.index_value(pixel);
            1.0 / (1.0 + (-self.sharpness * (index - self.threshold)).exp())
        }))
    }
}
