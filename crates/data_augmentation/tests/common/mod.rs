//! Shared helpers for the transformer integration tests.
#![allow(dead_code)]

use data_augmentation::{DataTransformer, Phase, Sample, SeedCounter, TransformConfig};
use image::{DynamicImage, GrayImage};

/// A single-channel sample whose pixel at `(h, w)` holds `h * width + w`,
/// so any crop window is identifiable from its values.
pub fn indexed_sample(height: u32, width: u32) -> Sample {
    let data: Vec<u8> = (0..height * width).map(|v| v as u8).collect();
    Sample::from_bytes(1, height, width, data).unwrap()
}

/// A 3-channel sample with distinct per-channel planes.
pub fn three_channel_sample(height: u32, width: u32) -> Sample {
    let plane = (height * width) as usize;
    let mut data = vec![0u8; 3 * plane];
    for c in 0..3usize {
        for i in 0..plane {
            data[c * plane + i] = (c * 50 + i) as u8;
        }
    }
    Sample::from_bytes(3, height, width, data).unwrap()
}

/// PNG-encodes a grayscale gradient so the decoded path sees known pixels.
pub fn encoded_gradient(height: u32, width: u32) -> Sample {
    let img = GrayImage::from_fn(width, height, |x, y| image::Luma([(y * width + x) as u8]));
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    Sample::from_encoded(bytes)
}

pub fn transformer(config: TransformConfig, phase: Phase) -> DataTransformer {
    DataTransformer::new(config, phase, &SeedCounter::default()).unwrap()
}
