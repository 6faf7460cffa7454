use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlacierError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid model file {path}: {source}")]
    ModelFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write image {path}: {source}")]
    ImageWrite {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot write CSV {path}: {source}")]
    CsvWrite {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Rasters are not co-registered: image is {0}x{1}, label is {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),

    #[error("Malformed tile at row={row}, col={col}: expected {expected:?}, got {actual:?}")]
    MalformedTile {
        row: usize,
        col: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Classifier failed on tile at row={row}, col={col}: {reason}")]
    Classifier {
        row: usize,
        col: usize,
        reason: String,
    },

    #[error("Classifier did not answer within {0:.1} s")]
    ClassifierTimeout(f64),

    #[error("Invalid classifier timeout: {0} seconds (must be positive)")]
    InvalidTimeout(f64),

    #[error("Classifier worker exited without a result")]
    ClassifierAborted,

    #[error("Invalid tile size: {0} (must be positive)")]
    InvalidTileSize(usize),

    #[error("Invalid stride: {0} (must be positive)")]
    InvalidStride(usize),

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Pixel size is non-positive: {0}")]
    InvalidPixelSize(f64),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid block size: {0} (must be multiple of 16)")]
    InvalidBlockSize(usize),

    #[error("Unsupported band count for PNG output: {0}")]
    UnsupportedBandCount(usize),

    #[error("Band count mismatch: expected {expected}, got {actual}")]
    InvalidBandCount { expected: usize, actual: usize },

    #[error("Band index {band} out of range for a {bands}-band tile")]
    BandOutOfRange { band: usize, bands: usize },
}

pub type Result<T> = std::result::Result<T, GlacierError>;
