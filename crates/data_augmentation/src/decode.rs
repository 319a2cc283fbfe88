//! src/decode.rs
//!
//! Decode adapter: the boundary to the external image codec.
//!
//! The pipeline never interprets encoded bytes itself; it hands them to the
//! `image` crate and normalizes the result to one of two working formats,
//! 8-bit grayscale or 8-bit RGB. Conversions between the codec's
//! interleaved row-major layout and the pipeline's planar channel-major
//! layout also live here.

use crate::error::{Result, TransformError};
use image::{DynamicImage, GrayImage, RgbImage};

/// Decodes encoded bytes into a raw pixel buffer of known channels.
///
/// With `force_color` the result is always RGB; with `force_gray` always
/// grayscale; otherwise the image keeps its native channel count,
/// normalized to `Luma8` or `Rgb8`.
pub fn decode_image(bytes: &[u8], force_color: bool, force_gray: bool) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(if force_color {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else if force_gray {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else {
        match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) => {
                DynamicImage::ImageLuma8(img.to_luma8())
            }
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        }
    })
}

/// Channel count of a normalized working image.
pub fn image_channels(img: &DynamicImage) -> u32 {
    match img {
        DynamicImage::ImageLuma8(_) => 1,
        _ => 3,
    }
}

/// Rebuilds a working image from a raw planar sample buffer.
pub fn planar_bytes_to_image(
    channels: u32,
    height: u32,
    width: u32,
    planar: &[u8],
) -> Result<DynamicImage> {
    let plane = height as usize * width as usize;
    if planar.len() != channels as usize * plane {
        return Err(TransformError::invalid_config(format!(
            "planar buffer length {} does not match {}x{}x{}",
            planar.len(),
            channels,
            height,
            width
        )));
    }
    match channels {
        1 => {
            let buf = GrayImage::from_raw(width, height, planar.to_vec())
                .expect("grayscale buffer length already checked");
            Ok(DynamicImage::ImageLuma8(buf))
        }
        3 => {
            let mut interleaved = vec![0u8; planar.len()];
            for c in 0..3usize {
                for i in 0..plane {
                    interleaved[i * 3 + c] = planar[c * plane + i];
                }
            }
            let buf = RgbImage::from_raw(width, height, interleaved)
                .expect("rgb buffer length already checked");
            Ok(DynamicImage::ImageRgb8(buf))
        }
        n => Err(TransformError::unsupported(format!(
            "raw samples must have 1 or 3 channels (got {n})"
        ))),
    }
}

/// Flattens a working image into planar channel-major bytes.
pub fn image_to_planar_bytes(img: &DynamicImage) -> (u32, u32, u32, Vec<u8>) {
    let channels = image_channels(img) as usize;
    let (width, height) = (img.width(), img.height());
    let plane = height as usize * width as usize;
    let interleaved = img.as_bytes();
    let mut planar = vec![0u8; channels * plane];
    for i in 0..plane {
        for c in 0..channels {
            planar[c * plane + i] = interleaved[i * channels + c];
        }
    }
    (channels as u32, height, width, planar)
}
