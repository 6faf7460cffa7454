//! Training patch extraction from a co-registered image/label raster pair.

use crate::error::{GlacierError, Result};
use crate::grid::{TileGrid, TileOrigin};
use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3};

pub const DEFAULT_TILE_SIZE: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct TilerConfig {
    pub tile_size: usize,
    pub stride: usize,
    /// Keep tiles whose label window is entirely zero.
    pub include_empty: bool,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            stride: DEFAULT_TILE_SIZE,
            include_empty: false,
        }
    }
}

/// One emitted training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePair {
    /// Position among emitted pairs, starting at zero.
    pub index: usize,
    pub origin: TileOrigin,
    /// `(tile, tile, bands)`, rescaled to the full 0..=255 range.
    pub image: Array3<u8>,
    /// `(tile, tile)`, copied unchanged from the label raster.
    pub label: Array2<u8>,
}

/// Lazily walks the tile grid and yields normalised image/label pairs.
pub struct TilePairs<'a> {
    image: ArrayView3<'a, f32>,
    label: ArrayView2<'a, u8>,
    include_empty: bool,
    grid: TileGrid,
    cursor: usize,
    next_index: usize,
    failed: bool,
}

/// Build the tile pair sequence for `image` `(height, width, bands)` and
/// `label` `(height, width)`.
pub fn tile_pairs<'a>(
    image: ArrayView3<'a, f32>,
    label: ArrayView2<'a, u8>,
    config: TilerConfig,
) -> Result<TilePairs<'a>> {
    let (img_h, img_w, _) = image.dim();
    let (lbl_h, lbl_w) = label.dim();

    if img_h != lbl_h || img_w != lbl_w {
        return Err(GlacierError::ShapeMismatch(img_w, img_h, lbl_w, lbl_h));
    }

    let grid = TileGrid::new(img_h, img_w, config.tile_size, config.stride)?;

    Ok(TilePairs {
        image,
        label,
        include_empty: config.include_empty,
        grid,
        cursor: 0,
        next_index: 0,
        failed: false,
    })
}

impl<'a> TilePairs<'a> {
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    fn read_pair(&self, origin: TileOrigin) -> Result<(ArrayView3<'a, f32>, ArrayView2<'a, u8>)> {
        let bands = self.image.dim().2;
        let img_tile = self
            .image
            .slice_move(s![origin.row..origin.row_end(), origin.col..origin.col_end(), ..]);
        let lbl_tile = self
            .label
            .slice_move(s![origin.row..origin.row_end(), origin.col..origin.col_end()]);

        let expected = [origin.size, origin.size, bands];
        if img_tile.shape() != expected || lbl_tile.shape() != &expected[..2] {
            return Err(GlacierError::MalformedTile {
                row: origin.row,
                col: origin.col,
                expected: expected.to_vec(),
                actual: img_tile.shape().to_vec(),
            });
        }

        Ok((img_tile, lbl_tile))
    }
}

impl<'a> Iterator for TilePairs<'a> {
    type Item = Result<TilePair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some(origin) = self.grid.get(self.cursor) {
            self.cursor += 1;

            let (img_tile, lbl_tile) = match self.read_pair(origin) {
                Ok(pair) => pair,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };

            if !self.include_empty && lbl_tile.iter().all(|&v| v == 0) {
                debug!("Dropping empty label tile at row={}, col={}", origin.row, origin.col);
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;

            return Some(Ok(TilePair {
                index,
                origin,
                image: normalize_tile(img_tile),
                label: lbl_tile.to_owned(),
            }));
        }

        None
    }
}

/// Stretch a tile to 0..=255 using its own min and max over all bands.
///
/// A constant tile has no range to stretch and becomes all zero.
pub fn normalize_tile(tile: ArrayView3<'_, f32>) -> Array3<u8> {
    let (min, max) = tile
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return Array3::zeros(tile.raw_dim());
    }

    tile.mapv(|v| (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn cfg(tile_size: usize, stride: usize) -> TilerConfig {
        TilerConfig {
            tile_size,
            stride,
            include_empty: true,
        }
    }

    fn skip_empty(config: TilerConfig) -> TilerConfig {
        TilerConfig {
            include_empty: false,
            ..config
        }
    }

    fn ramp_image(height: usize, width: usize, bands: usize) -> Array3<f32> {
        Array::from_shape_fn((height, width, bands), |(r, c, b)| (r * width + c + b) as f32)
    }

    #[test]
    fn test_constant_tile_normalizes_to_zero() {
        let tile = Array3::<f32>::from_elem((4, 4, 3), 5.0);
        let out = normalize_tile(tile.view());
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_normalize_spans_full_range() {
        let tile = Array::from_shape_vec((1, 3, 1), vec![10.0f32, 15.0, 20.0]).unwrap();
        let out = normalize_tile(tile.view());
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0, 128, 255]);
    }

    #[test]
    fn test_normalize_uses_min_max_across_bands() {
        let tile = Array::from_shape_vec((1, 1, 3), vec![0.0f32, 100.0, 200.0]).unwrap();
        let out = normalize_tile(tile.view());
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0, 128, 255]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let image = Array3::<f32>::zeros((10, 10, 3));
        let label = Array2::<u8>::zeros((10, 9));
        let config = cfg(5, 5);
        let err = tile_pairs(image.view(), label.view(), config).err().unwrap();
        assert!(matches!(err, GlacierError::ShapeMismatch(10, 10, 9, 10)));
    }

    #[test]
    fn test_empty_labels_are_dropped() {
        let image = ramp_image(64, 64, 3);
        let label = Array2::<u8>::zeros((64, 64));
        let config = cfg(16, 16);
        let pairs: Vec<_> = tile_pairs(image.view(), label.view(), skip_empty(config))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_include_empty_keeps_every_tile() {
        let image = ramp_image(64, 48, 3);
        let label = Array2::<u8>::zeros((64, 48));
        let config = cfg(16, 16);
        let pairs: Vec<_> = tile_pairs(image.view(), label.view(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(pairs.len(), 12);
        assert!(pairs.iter().enumerate().all(|(i, p)| p.index == i));
    }

    #[test]
    fn test_indices_count_only_emitted_tiles() {
        let image = ramp_image(32, 32, 1);
        let mut label = Array2::<u8>::zeros((32, 32));
        // Glacier only in the top-right and bottom-right tiles.
        label[[3, 20]] = 1;
        label[[20, 31]] = 1;
        let config = cfg(16, 16);
        let pairs: Vec<_> = tile_pairs(image.view(), label.view(), skip_empty(config))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].index, pairs[0].origin.row, pairs[0].origin.col), (0, 0, 16));
        assert_eq!((pairs[1].index, pairs[1].origin.row, pairs[1].origin.col), (1, 16, 16));
        assert_eq!(pairs[0].label[[3, 4]], 1);
    }

    #[test]
    fn test_tiles_are_deterministic() {
        let image = ramp_image(50, 70, 3);
        let label = Array2::from_shape_fn((50, 70), |(r, c)| ((r + c) % 7 == 0) as u8);
        let config = cfg(20, 10);

        let first: Vec<_> = tile_pairs(image.view(), label.view(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let second: Vec<_> = tile_pairs(image.view(), label.view(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), TileGrid::new(50, 70, 20, 10).unwrap().len());
    }

    #[test]
    fn test_tile_content_matches_source_window() {
        let image = ramp_image(20, 20, 2);
        let label = Array2::from_shape_fn((20, 20), |(r, c)| (r * 20 + c) as u8);
        let config = cfg(8, 8);
        let pairs: Vec<_> = tile_pairs(image.view(), label.view(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let last = pairs.last().unwrap();
        assert_eq!((last.origin.row, last.origin.col), (8, 8));
        assert_eq!(last.label[[0, 0]], label[[8, 8]]);
        assert_eq!(last.image.dim(), (8, 8, 2));
    }
}
