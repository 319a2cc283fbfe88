//! src/ops/photometric.rs
//!
//! Color and appearance primitives for the decoded-image path. All of them
//! operate on 8-bit samples and saturate to the `[0, 255]` range; the
//! floating-point raw-sample path never goes through these.

use crate::decode::image_channels;
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::filter::{gaussian_blur_f32, median_filter};

/// Adds (or subtracts) a constant per channel, uniformly over the image.
///
/// Shift magnitudes are drawn per channel; a single sign applies to all of
/// them. Grayscale images use the first magnitude only.
pub fn channel_shift(img: &mut DynamicImage, shifts: [u32; 3], subtract: bool) {
    let apply = |value: u8, shift: u32| -> u8 {
        let shift = shift.min(255) as u8;
        if subtract {
            value.saturating_sub(shift)
        } else {
            value.saturating_add(shift)
        }
    };
    match img {
        DynamicImage::ImageLuma8(gray) => {
            for pixel in gray.pixels_mut() {
                pixel.0[0] = apply(pixel.0[0], shifts[0]);
            }
        }
        DynamicImage::ImageRgb8(rgb) => {
            for pixel in rgb.pixels_mut() {
                for c in 0..3 {
                    pixel.0[c] = apply(pixel.0[c], shifts[c]);
                }
            }
        }
        other => {
            let mut rgb = other.to_rgb8();
            for pixel in rgb.pixels_mut() {
                for c in 0..3 {
                    pixel.0[c] = apply(pixel.0[c], shifts[c]);
                }
            }
            *other = DynamicImage::ImageRgb8(rgb);
        }
    }
}

/// Applies `pixel' = pixel * alpha + beta` with saturation to `[0, 255]`.
pub fn contrast_brightness(img: &mut DynamicImage, alpha: f32, beta: i32) {
    let apply = |value: u8| -> u8 {
        (value as f32 * alpha + beta as f32).round().clamp(0.0, 255.0) as u8
    };
    match img {
        DynamicImage::ImageLuma8(gray) => {
            for pixel in gray.pixels_mut() {
                pixel.0[0] = apply(pixel.0[0]);
            }
        }
        DynamicImage::ImageRgb8(rgb) => {
            for pixel in rgb.pixels_mut() {
                for c in 0..3 {
                    pixel.0[c] = apply(pixel.0[c]);
                }
            }
        }
        other => {
            let mut rgb = other.to_rgb8();
            for pixel in rgb.pixels_mut() {
                for c in 0..3 {
                    pixel.0[c] = apply(pixel.0[c]);
                }
            }
            *other = DynamicImage::ImageRgb8(rgb);
        }
    }
}

/// The four smoothing filter kinds, drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothKind {
    Gaussian,
    Box,
    Median,
    /// Box filter over a doubled kernel, the coarsest of the four.
    WideBox,
}

impl SmoothKind {
    pub fn from_index(index: u32) -> Self {
        match index % 4 {
            0 => SmoothKind::Gaussian,
            1 => SmoothKind::Box,
            2 => SmoothKind::Median,
            _ => SmoothKind::WideBox,
        }
    }
}

/// Applies the chosen smoothing filter with an odd `kernel` size.
pub fn smooth(img: &DynamicImage, kind: SmoothKind, kernel: u32) -> DynamicImage {
    if kernel <= 1 && kind != SmoothKind::WideBox {
        return img.clone();
    }
    match kind {
        SmoothKind::Gaussian => {
            // sigma derived from the kernel size the way OpenCV does for
            // sigma == 0
            let sigma = 0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            match img {
                DynamicImage::ImageLuma8(gray) => {
                    DynamicImage::ImageLuma8(gaussian_blur_f32(gray, sigma))
                }
                _ => DynamicImage::ImageRgb8(gaussian_blur_f32(&img.to_rgb8(), sigma)),
            }
        }
        SmoothKind::Box => mean_blur(img, kernel),
        SmoothKind::Median => {
            let radius = kernel / 2;
            match img {
                DynamicImage::ImageLuma8(gray) => {
                    DynamicImage::ImageLuma8(median_filter(gray, radius, radius))
                }
                _ => DynamicImage::ImageRgb8(median_filter(&img.to_rgb8(), radius, radius)),
            }
        }
        SmoothKind::WideBox => mean_blur(img, kernel * 2),
    }
}

/// Normalized box (mean) blur with clamped borders.
fn mean_blur(img: &DynamicImage, kernel: u32) -> DynamicImage {
    let (width, height) = (img.width() as i64, img.height() as i64);
    let channels = image_channels(img) as usize;
    let src = img.as_bytes();
    let k = kernel.max(1) as i64;
    let anchor = k / 2;
    let norm = (k * k) as f32;

    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0f32; 3];
            for ky in 0..k {
                let sy = (y + ky - anchor).clamp(0, height - 1);
                for kx in 0..k {
                    let sx = (x + kx - anchor).clamp(0, width - 1);
                    let base = ((sy * width + sx) as usize) * channels;
                    for c in 0..channels {
                        acc[c] += src[base + c] as f32;
                    }
                }
            }
            let base = ((y * width + x) as usize) * channels;
            for c in 0..channels {
                out[base + c] = (acc[c] / norm).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    match channels {
        1 => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width as u32, height as u32, out)
                .expect("mean blur buffer has the source size"),
        ),
        _ => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width as u32, height as u32, out)
                .expect("mean blur buffer has the source size"),
        ),
    }
}
