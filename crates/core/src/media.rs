//! Reference-image metadata.
//!
//! The frame's absolute pixel extents require the pixel dimensions of
//! the image the anchors were calibrated against. This module reads
//! those dimensions from disk; it never decodes pixel data.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Pixel dimensions of a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Read the pixel dimensions of an image file without decoding it.
pub fn read_image_dimensions(path: &Path) -> Result<ImageDimensions, CoreError> {
    let (width, height) = image::image_dimensions(path).map_err(|e| {
        CoreError::Internal(format!(
            "could not read dimensions of '{}': {e}",
            path.display()
        ))
    })?;
    Ok(ImageDimensions { width, height })
}
