//! Working raster encoding.
//!
//! PNG output keeps the source's color type (alpha included). JPEG output is
//! always 8-bit RGB, encoded with the `image` crate's JPEG encoder.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageFormat};

use crate::types::{ImposeError, RasterFormat, Result};

/// An encoded image ready to be embedded in a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRaster {
    /// PNG or JPEG file bytes
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedRaster {
    /// Container format sniffed from the leading bytes
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }
}

/// Encode `image` in the requested raster format.
pub fn encode_raster(image: &DynamicImage, format: RasterFormat) -> Result<EncodedRaster> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImposeError::Encode(format!(
            "cannot encode an empty {}x{} image",
            width, height
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    match format {
        RasterFormat::Png => {
            image
                .write_to(&mut buffer, ImageFormat::Png)
                .map_err(|e| ImposeError::Encode(e.to_string()))?;
        }
        RasterFormat::Jpeg { quality } => {
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            encoder
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| ImposeError::Encode(e.to_string()))?;
        }
    }

    Ok(EncodedRaster {
        bytes: buffer.into_inner(),
        width,
        height,
    })
}
