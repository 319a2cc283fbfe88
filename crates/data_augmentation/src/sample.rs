//! src/sample.rs
//!
//! The `Sample` struct represents one labeled input unit: an encoded or raw
//! image plus an optional scalar label.
//!
//! Raw pixel data is stored in planar channel-major layout
//! (`index = (c * height + h) * width + w`), matching the layout the
//! pipeline writes into the output tensor. Two raw representations are
//! supported: 8-bit unsigned samples and floating-point samples. The
//! float representation skips the 8-bit saturation semantics of the
//! color-jitter stages, which only apply to decoded images.

use crate::error::{ensure_config, Result};

/// Pixel payload of a [`Sample`].
#[derive(Debug, Clone)]
pub enum SampleData {
    /// Raw 8-bit samples in planar channel-major layout.
    Bytes { channels: u32, height: u32, width: u32, data: Vec<u8> },
    /// Raw floating-point samples in planar channel-major layout.
    Floats { channels: u32, height: u32, width: u32, data: Vec<f32> },
    /// Encoded image bytes (JPEG/PNG/...), decoded by the codec adapter.
    Encoded(Vec<u8>),
}

/// One labeled input unit. Immutable input to a transform call, except for
/// the variable-sized pipeline which rewrites the pixel payload in place.
#[derive(Debug, Clone)]
pub struct Sample {
    pub data: SampleData,
    pub label: Option<f32>,
}

impl Sample {
    /// Creates a raw 8-bit sample. The buffer length must match the
    /// declared dimensions.
    pub fn from_bytes(channels: u32, height: u32, width: u32, data: Vec<u8>) -> Result<Self> {
        let expected = channels as usize * height as usize * width as usize;
        ensure_config!(
            data.len() == expected,
            "sample buffer length {} does not match declared dimensions {}x{}x{}",
            data.len(),
            channels,
            height,
            width
        );
        Ok(Self { data: SampleData::Bytes { channels, height, width, data }, label: None })
    }

    /// Creates a raw floating-point sample.
    pub fn from_floats(channels: u32, height: u32, width: u32, data: Vec<f32>) -> Result<Self> {
        let expected = channels as usize * height as usize * width as usize;
        ensure_config!(
            data.len() == expected,
            "sample buffer length {} does not match declared dimensions {}x{}x{}",
            data.len(),
            channels,
            height,
            width
        );
        Ok(Self { data: SampleData::Floats { channels, height, width, data }, label: None })
    }

    /// Creates an encoded sample. Dimensions are learned at decode time.
    pub fn from_encoded(bytes: Vec<u8>) -> Self {
        Self { data: SampleData::Encoded(bytes), label: None }
    }

    /// Attaches a scalar label.
    pub fn with_label(mut self, label: f32) -> Self {
        self.label = Some(label);
        self
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self.data, SampleData::Encoded(_))
    }

    /// Declared `(channels, height, width)` for raw samples, `None` for
    /// encoded samples.
    pub fn raw_dimensions(&self) -> Option<(u32, u32, u32)> {
        match &self.data {
            SampleData::Bytes { channels, height, width, .. }
            | SampleData::Floats { channels, height, width, .. } => {
                Some((*channels, *height, *width))
            }
            SampleData::Encoded(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    #[test]
    fn test_sample_length_validation() {
        assert!(Sample::from_bytes(1, 2, 2, vec![0; 4]).is_ok());
        let err = Sample::from_bytes(3, 2, 2, vec![0; 4]).unwrap_err();
        assert!(matches!(err, TransformError::InvalidConfig(_)));
    }

    #[test]
    fn test_sample_label() {
        let sample = Sample::from_bytes(1, 1, 1, vec![7]).unwrap().with_label(5.0);
        assert_eq!(sample.label, Some(5.0));
        assert_eq!(sample.raw_dimensions(), Some((1, 1, 1)));
        assert!(!sample.is_encoded());
    }
}
