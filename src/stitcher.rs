use crate::classifier::Classifier;
use crate::error::{GlacierError, Result};
use crate::grid::{TileGrid, TileOrigin};
use log::{debug, info, warn};
use ndarray::{s, Array2, ArrayView3, Axis};
use rayon::prelude::*;

/// Mask value written for pixels classified as glacier.
pub const GLACIER_CODE: u8 = 255;

/// Probabilities strictly above this are glacier.
pub const PROBABILITY_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StitchSummary {
    pub classified: usize,
    pub skipped: usize,
    /// Bottom rows and right columns left at the zero fill.
    pub uncovered_margin: (usize, usize),
}

/// Classify every full non-overlapping tile of `image` `(height, width, bands)`
/// and assemble the results into a `(height, width)` mask of 0 / 255.
///
/// The mask is split into disjoint tile-sized windows which are classified
/// and filled in parallel; no classified tile outlives its own window.
pub fn stitch<C: Classifier + ?Sized>(
    image: ArrayView3<'_, f32>,
    tile_size: usize,
    classifier: &C,
) -> Result<(Array2<u8>, StitchSummary)> {
    let (height, width, bands) = image.dim();
    let grid = TileGrid::non_overlapping(height, width, tile_size)?;
    let expected_bands = classifier.input_bands();

    if bands != expected_bands {
        warn!(
            "Raster has {} bands but the classifier expects {}; every tile will be skipped",
            bands, expected_bands
        );
    }

    info!(
        "Classifying {} tiles of {}x{} ({}x{} grid)",
        grid.len(),
        tile_size,
        tile_size,
        grid.num_cols,
        grid.num_rows
    );

    let mut mask = Array2::<u8>::zeros((height, width));

    // Trailing partial chunks are the uncovered margin and stay zero.
    let (classified, skipped) = mask
        .axis_chunks_iter_mut(Axis(0), tile_size)
        .into_par_iter()
        .take(grid.num_rows)
        .enumerate()
        .map(|(tile_row, mut row_band)| -> Result<(usize, usize)> {
            row_band
                .axis_chunks_iter_mut(Axis(1), tile_size)
                .into_par_iter()
                .take(grid.num_cols)
                .enumerate()
                .map(|(tile_col, mut window)| -> Result<(usize, usize)> {
                    let Some(origin) = grid.get(tile_row * grid.num_cols + tile_col) else {
                        return Ok((0, 0));
                    };
                    match classify_tile(image, origin, expected_bands, classifier)? {
                        Some(tile) => {
                            window.assign(&tile);
                            Ok((1, 0))
                        }
                        None => Ok((0, 1)),
                    }
                })
                .try_reduce(|| (0, 0), add_counts)
        })
        .try_reduce(|| (0, 0), add_counts)?;

    let summary = StitchSummary {
        classified,
        skipped,
        uncovered_margin: grid.uncovered_margin(),
    };
    info!(
        "Prediction complete for {} tiles ({} skipped, uncovered margin {:?})",
        summary.classified, summary.skipped, summary.uncovered_margin
    );

    Ok((mask, summary))
}

fn add_counts(a: (usize, usize), b: (usize, usize)) -> Result<(usize, usize)> {
    Ok((a.0 + b.0, a.1 + b.1))
}

fn classify_tile<C: Classifier + ?Sized>(
    image: ArrayView3<'_, f32>,
    origin: TileOrigin,
    expected_bands: usize,
    classifier: &C,
) -> Result<Option<Array2<u8>>> {
    debug!("Processing tile at row={}, col={}", origin.row, origin.col);

    let tile = image
        .slice(s![origin.row..origin.row_end(), origin.col..origin.col_end(), ..])
        .mapv(|v| v / 255.0);

    let expected = (origin.size, origin.size, expected_bands);
    if tile.dim() != expected {
        let err = GlacierError::MalformedTile {
            row: origin.row,
            col: origin.col,
            expected: vec![expected.0, expected.1, expected.2],
            actual: tile.shape().to_vec(),
        };
        warn!("Skipping tile: {}", err);
        return Ok(None);
    }

    let probabilities = classifier
        .predict(tile.view())
        .map_err(|e| GlacierError::Classifier {
            row: origin.row,
            col: origin.col,
            reason: e.to_string(),
        })?;

    if probabilities.dim() != (origin.size, origin.size) {
        return Err(GlacierError::Classifier {
            row: origin.row,
            col: origin.col,
            reason: format!(
                "expected a {}x{} probability map, got {:?}",
                origin.size,
                origin.size,
                probabilities.shape()
            ),
        });
    }

    let binary = probabilities.mapv(|p| {
        if p > PROBABILITY_THRESHOLD {
            GLACIER_CODE
        } else {
            0
        }
    });

    Ok(Some(binary))
}
