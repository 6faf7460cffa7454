//! GeoTIFF creation options for written masks.

use crate::error::{GlacierError, Result};

pub const DEFAULT_COMPRESSION: &str = "LZW";
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Validate compression type
pub fn validate_compression(compression: &str) -> Result<()> {
    let valid_types = ["LZW", "DEFLATE", "ZSTD", "PACKBITS", "NONE"];
    if !valid_types.contains(&compression) {
        return Err(GlacierError::InvalidCompression(compression.to_string()));
    }
    Ok(())
}

/// Validate block size (must be multiple of 16)
pub fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size == 0 || block_size % 16 != 0 {
        return Err(GlacierError::InvalidBlockSize(block_size));
    }
    Ok(())
}

/// Creation options for a tiled, compressed mask.
pub fn mask_dataset_options(compression: &str, block_size: usize) -> Result<Vec<String>> {
    let compression = compression.to_ascii_uppercase();
    validate_compression(&compression)?;
    validate_block_size(block_size)?;

    Ok(vec![
        format!("COMPRESS={}", compression),
        "TILED=YES".to_string(),
        format!("BLOCKXSIZE={}", block_size),
        format!("BLOCKYSIZE={}", block_size),
        "BIGTIFF=IF_SAFER".to_string(),
    ])
}
