use approx::assert_relative_eq;
use glacier_tiles::model::SpectralIndex;
use glacier_tiles::{
    glacier_area_km2, stitch, tile_pairs, Classifier, GlacierError, IndexModel, TileGrid,
    TilerConfig, GLACIER_CODE,
};
use ndarray::{Array2, Array3, ArrayView3};

/// Synthetic 3-band scene: a bright "glacier" block on dark rock.
fn scene(height: usize, width: usize, glacier: (usize, usize, usize, usize)) -> (Array3<f32>, Array2<u8>) {
    let (r0, r1, c0, c1) = glacier;
    let label = Array2::from_shape_fn((height, width), |(r, c)| {
        (r >= r0 && r < r1 && c >= c0 && c < c1) as u8
    });
    let image = Array3::from_shape_fn((height, width, 3), |(r, c, b)| {
        if label[[r, c]] == 1 {
            230.0 + b as f32
        } else {
            40.0 + ((r + c) % 10) as f32
        }
    });
    (image, label)
}

fn brightness_model() -> IndexModel {
    IndexModel {
        input_bands: 3,
        index: SpectralIndex::Brightness,
        threshold: 0.5,
        sharpness: 12.0,
    }
}

#[test]
fn patches_cover_only_labelled_tiles() {
    let (image, label) = scene(300, 300, (0, 100, 0, 100));
    let config = TilerConfig {
        tile_size: 128,
        stride: 128,
        include_empty: false,
    };
    let pairs: Vec<_> = tile_pairs(image.view(), label.view(), config)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!((pairs[0].origin.row, pairs[0].origin.col), (0, 0));
    // Mixed tile stretches to the full byte range.
    assert_eq!(pairs[0].image.iter().copied().max(), Some(255));
    assert_eq!(pairs[0].image.iter().copied().min(), Some(0));

    let all: Vec<_> = tile_pairs(
        image.view(),
        label.view(),
        TilerConfig {
            include_empty: true,
            ..config
        },
    )
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();
    assert_eq!(all.len(), 4);
    assert!(all
        .iter()
        .all(|p| p.origin.row_end() <= 300 && p.origin.col_end() <= 300));
}

#[test]
fn predicted_area_matches_label_inside_covered_region() {
    // Glacier fits entirely inside the covered 256x256 region.
    let (image, label) = scene(300, 280, (32, 160, 64, 192));
    let (mask, summary) = stitch(image.view(), 64, &brightness_model()).unwrap();

    assert_eq!(summary.classified, 4 * 4);
    assert_eq!(summary.uncovered_margin, (44, 24));

    let expected = label.mapv(|v| if v == 1 { GLACIER_CODE } else { 0 });
    assert_eq!(mask, expected);

    // 128 × 128 pixels at 10 m.
    assert_relative_eq!(glacier_area_km2(mask.view(), 10.0, 10.0), 1.638);
}

#[test]
fn margin_is_never_classified() {
    let image = Array3::<f32>::from_elem((100, 70, 3), 255.0);
    let (mask, _) = stitch(image.view(), 32, &brightness_model()).unwrap();
    let grid = TileGrid::non_overlapping(100, 70, 32).unwrap();

    let covered = grid.len() * 32 * 32;
    assert_eq!(mask.iter().filter(|&&v| v == GLACIER_CODE).count(), covered);
    assert!(mask.slice(ndarray::s![96.., ..]).iter().all(|&v| v == 0));
    assert!(mask.slice(ndarray::s![.., 64..]).iter().all(|&v| v == 0));
}

struct Refuses;

impl Classifier for Refuses {
    fn input_bands(&self) -> usize {
        3
    }

    fn predict(&self, _tile: ArrayView3<'_, f32>) -> glacier_tiles::Result<Array2<f32>> {
        Err(GlacierError::ClassifierAborted)
    }
}

#[test]
fn classifier_failure_aborts_run() {
    let (image, _) = scene(64, 64, (0, 10, 0, 10));
    let err = stitch(image.view(), 32, &Refuses).unwrap_err();
    assert!(matches!(err, GlacierError::Classifier { .. }));
    assert!(err.to_string().contains("row="));
}
