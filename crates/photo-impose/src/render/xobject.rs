//! Image XObject creation
//!
//! JPEG rasters are embedded untouched with DCTDecode. PNG rasters are
//! decoded and stored as Flate-compressed 8-bit samples, with a separate
//! soft mask when they carry transparency.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::normalize::EncodedRaster;
use crate::types::{ImposeError, Result};

// =============================================================================
// XObject Creation
// =============================================================================

/// Add `raster` to `doc` as an image XObject and return its id.
///
/// Anything other than PNG or JPEG is rejected.
pub fn embed_raster(doc: &mut Document, raster: &EncodedRaster) -> Result<ObjectId> {
    match raster.format() {
        Some(ImageFormat::Jpeg) => embed_jpeg(doc, &raster.bytes),
        Some(ImageFormat::Png) => embed_png(doc, &raster.bytes),
        Some(other) => Err(ImposeError::UnsupportedFormat(format!(
            "{:?} rasters cannot be embedded, use PNG or JPEG",
            other
        ))),
        None => Err(ImposeError::UnsupportedFormat(
            "unrecognized raster data".to_string(),
        )),
    }
}

fn embed_jpeg(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| ImposeError::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();
    let color_space = match decoded.color() {
        ColorType::L8 | ColorType::L16 => "DeviceGray",
        _ => "DeviceRGB",
    };

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes.to_vec(),
    )
    .with_compression(false);

    Ok(doc.add_object(stream))
}

fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<ObjectId> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| ImposeError::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();
    let (rgb, alpha) = split_alpha(&decoded);

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = alpha {
        let smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        )
        .with_compression(false);
        let smask_id = doc.add_object(smask);
        dict.set("SMask", Object::Reference(smask_id));
    }

    let stream = Stream::new(dict, deflate(&rgb)?).with_compression(false);
    Ok(doc.add_object(stream))
}

/// RGB samples plus the alpha channel when any pixel is not fully opaque
fn split_alpha(image: &DynamicImage) -> (Vec<u8>, Option<Vec<u8>>) {
    if !image.color().has_alpha() {
        return (image.to_rgb8().into_raw(), None);
    }

    let rgba = image.to_rgba8();
    if rgba.pixels().all(|p| p[3] == u8::MAX) {
        return (image.to_rgb8().into_raw(), None);
    }

    let pixel_count = (rgba.width() * rgba.height()) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }
    (rgb, Some(alpha))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
