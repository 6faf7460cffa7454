use crate::error::{GlacierError, Result};
use log::debug;

/// A square window fully inside the source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOrigin {
    pub row: usize,
    pub col: usize,
    pub size: usize,
}

impl TileOrigin {
    pub fn row_end(&self) -> usize {
        self.row + self.size
    }

    pub fn col_end(&self) -> usize {
        self.col + self.size
    }

    pub fn overlaps(&self, other: &TileOrigin) -> bool {
        self.row < other.row_end()
            && other.row < self.row_end()
            && self.col < other.col_end()
            && other.col < self.col_end()
    }
}

/// Row-major grid of tile origins over a `(height, width)` raster.
///
/// Candidate origins step by `stride` from zero; a candidate is kept only if
/// the whole `tile_size` window fits inside the raster. Partial windows along
/// the right and bottom edges are skipped, never clipped or padded.
#[derive(Debug, Clone)]
pub struct TileGrid {
    raster_height: usize,
    raster_width: usize,
    tile_size: usize,
    stride: usize,
    pub num_rows: usize,
    pub num_cols: usize,
    pub total_tiles: usize,
}

impl TileGrid {
    pub fn new(
        raster_height: usize,
        raster_width: usize,
        tile_size: usize,
        stride: usize,
    ) -> Result<Self> {
        if tile_size == 0 {
            return Err(GlacierError::InvalidTileSize(tile_size));
        }
        if stride == 0 {
            return Err(GlacierError::InvalidStride(stride));
        }

        let num_rows = valid_steps(raster_height, tile_size, stride);
        let num_cols = valid_steps(raster_width, tile_size, stride);
        let total_tiles = num_rows * num_cols;

        debug!(
            "TileGrid: {}x{} raster, tile_size={}, stride={} → {}x{} tiles ({} total)",
            raster_width, raster_height, tile_size, stride, num_cols, num_rows, total_tiles
        );

        Ok(Self {
            raster_height,
            raster_width,
            tile_size,
            stride,
            num_rows,
            num_cols,
            total_tiles,
        })
    }

    /// Non-overlapping grid, as used for inference.
    pub fn non_overlapping(raster_height: usize, raster_width: usize, tile_size: usize) -> Result<Self> {
        Self::new(raster_height, raster_width, tile_size, tile_size)
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.total_tiles
    }

    pub fn is_empty(&self) -> bool {
        self.total_tiles == 0
    }

    /// Origin of the `tile_idx`-th valid tile in row-major order.
    pub fn get(&self, tile_idx: usize) -> Option<TileOrigin> {
        if tile_idx >= self.total_tiles {
            return None;
        }

        let grid_row = tile_idx / self.num_cols;
        let grid_col = tile_idx % self.num_cols;

        let origin = TileOrigin {
            row: grid_row * self.stride,
            col: grid_col * self.stride,
            size: self.tile_size,
        };

        debug_assert!(origin.row_end() <= self.raster_height);
        debug_assert!(origin.col_end() <= self.raster_width);

        Some(origin)
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator::new(self)
    }

    /// Pixels not reached by any tile: `(bottom rows, right cols)`.
    pub fn uncovered_margin(&self) -> (usize, usize) {
        let covered_rows = if self.num_rows == 0 {
            0
        } else {
            (self.num_rows - 1) * self.stride + self.tile_size
        };
        let covered_cols = if self.num_cols == 0 {
            0
        } else {
            (self.num_cols - 1) * self.stride + self.tile_size
        };
        (
            self.raster_height - covered_rows,
            self.raster_width - covered_cols,
        )
    }
}

// Number of `k` with `k * stride + tile_size <= extent`.
fn valid_steps(extent: usize, tile_size: usize, stride: usize) -> usize {
    if extent < tile_size {
        0
    } else {
        (extent - tile_size) / stride + 1
    }
}

pub struct TileIterator<'a> {
    grid: &'a TileGrid,
    current_idx: usize,
}

impl<'a> TileIterator<'a> {
    fn new(grid: &'a TileGrid) -> Self {
        Self {
            grid,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = TileOrigin;

    fn next(&mut self) -> Option<Self::Item> {
        let origin = self.grid.get(self.current_idx)?;
        self.current_idx += 1;
        Some(origin)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.total_tiles.saturating_sub(self.current_idx);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for TileIterator<'a> {}
