// Library exports for testing and reuse

pub mod area;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod crs;
pub mod error;
pub mod grid;
pub mod io;
pub mod model;
pub mod output;
pub mod stitcher;
pub mod tiler;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use area::{glacier_area_km2, AreaRecord};
pub use classifier::{Classifier, TimeoutClassifier};
pub use error::{GlacierError, Result};
pub use grid::{TileGrid, TileOrigin};
pub use model::IndexModel;
pub use stitcher::{stitch, StitchSummary, GLACIER_CODE};
pub use tiler::{normalize_tile, tile_pairs, TilePair, TilerConfig};
