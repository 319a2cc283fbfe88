//! src/ops/geometric.rs
//!
//! Spatial primitives: resizing, cropping, rotation.

use crate::decode::image_channels;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Upscale with cubic (Catmull-Rom) interpolation.
pub fn resize_cubic(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::CatmullRom)
}

/// Downscale with pixel-area-relation interpolation.
///
/// Each destination pixel averages the source rectangle it covers,
/// weighting partially covered source pixels by their overlap. The `image`
/// crate has no area filter, so this is done directly on the interleaved
/// bytes.
pub fn resize_area(img: &DynamicImage, dst_width: u32, dst_height: u32) -> DynamicImage {
    let (src_width, src_height) = (img.width() as usize, img.height() as usize);
    let (dst_width_us, dst_height_us) = (dst_width as usize, dst_height as usize);
    let channels = image_channels(img) as usize;
    let src = img.as_bytes();

    let x_ratio = src_width as f32 / dst_width_us as f32;
    let y_ratio = src_height as f32 / dst_height_us as f32;
    let mut out = vec![0u8; dst_width_us * dst_height_us * channels];

    for dy in 0..dst_height_us {
        let fy0 = dy as f32 * y_ratio;
        let fy1 = fy0 + y_ratio;
        for dx in 0..dst_width_us {
            let fx0 = dx as f32 * x_ratio;
            let fx1 = fx0 + x_ratio;

            let mut acc = [0f32; 3];
            let mut area = 0f32;
            let mut sy = fy0.floor() as usize;
            while (sy as f32) < fy1 && sy < src_height {
                let cover_y = (fy1.min((sy + 1) as f32) - fy0.max(sy as f32)).max(0.0);
                let mut sx = fx0.floor() as usize;
                while (sx as f32) < fx1 && sx < src_width {
                    let cover_x = (fx1.min((sx + 1) as f32) - fx0.max(sx as f32)).max(0.0);
                    let weight = cover_x * cover_y;
                    let base = (sy * src_width + sx) * channels;
                    for c in 0..channels {
                        acc[c] += src[base + c] as f32 * weight;
                    }
                    area += weight;
                    sx += 1;
                }
                sy += 1;
            }

            let base = (dy * dst_width_us + dx) * channels;
            for c in 0..channels {
                out[base + c] = (acc[c] / area).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    match channels {
        1 => DynamicImage::ImageLuma8(
            GrayImage::from_raw(dst_width, dst_height, out)
                .expect("area resize buffer has the declared size"),
        ),
        _ => DynamicImage::ImageRgb8(
            RgbImage::from_raw(dst_width, dst_height, out)
                .expect("area resize buffer has the declared size"),
        ),
    }
}

/// Rescale preserving aspect ratio so the shorter side equals `target`;
/// the longer side is computed with `ceil`.
pub fn resize_min_side(img: &DynamicImage, target: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let (new_width, new_height) = if height <= width {
        let k = height as f64 / target as f64;
        ((width as f64 / k).ceil() as u32, target)
    } else {
        let k = width as f64 / target as f64;
        (target, (height as f64 / k).ceil() as u32)
    };
    img.resize_exact(new_width, new_height, FilterType::Triangle)
}

/// Extract the `width x height` region at `(x, y)`.
pub fn crop(img: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage {
    img.crop_imm(x, y, width, height)
}

/// Rotate about the image center by `degrees`, into an output bounding box
/// sized so no source pixel is clipped. Uncovered corners fill with zeros.
///
/// The bounding box can be narrower or shorter than the source (a long
/// image at a steep angle), so the rotation is staged on a canvas covering
/// both the source and the box, then cropped down to the box.
pub fn rotate_expanded(img: &DynamicImage, degrees: i32) -> DynamicImage {
    let theta = (degrees as f32).to_radians();
    let (sin_a, cos_a) = (theta.sin().abs(), theta.cos().abs());
    let (width, height) = (img.width(), img.height());
    // Snap float noise before the ceil so exact multiples of 90 degrees
    // produce the exact swapped box (cos(90deg) in f32 is -4.4e-8, not 0).
    let snap = |x: f32| (x * 1e4).round() / 1e4;
    let bbox_w = snap(width as f32 * cos_a + height as f32 * sin_a).ceil() as u32;
    let bbox_h = snap(width as f32 * sin_a + height as f32 * cos_a).ceil() as u32;
    let canvas_w = bbox_w.max(width);
    let canvas_h = bbox_h.max(height);
    let off_x = ((canvas_w - width) / 2) as i64;
    let off_y = ((canvas_h - height) / 2) as i64;

    let rotated = match img {
        DynamicImage::ImageLuma8(gray) => {
            let mut canvas = GrayImage::new(canvas_w, canvas_h);
            image::imageops::overlay(&mut canvas, gray, off_x, off_y);
            DynamicImage::ImageLuma8(rotate_about_center(
                &canvas,
                theta,
                Interpolation::Bilinear,
                Luma([0u8]),
            ))
        }
        _ => {
            let rgb = img.to_rgb8();
            let mut canvas = RgbImage::new(canvas_w, canvas_h);
            image::imageops::overlay(&mut canvas, &rgb, off_x, off_y);
            DynamicImage::ImageRgb8(rotate_about_center(
                &canvas,
                theta,
                Interpolation::Bilinear,
                Rgb([0u8, 0u8, 0u8]),
            ))
        }
    };
    rotated.crop_imm((canvas_w - bbox_w) / 2, (canvas_h - bbox_h) / 2, bbox_w, bbox_h)
}
