//! src/shape.rs
//!
//! NCHW shape tuple shared by shape inference and the output tensor region.

/// A `(num, channels, height, width)` shape.
///
/// A zero height or width marks a dimension that is not yet resolved while
/// the variable-sized pipeline is still running (a bare resize produces a
/// variable-sized image that must be terminated by a crop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub num: u32,
    pub channels: u32,
    pub height: u32,
    pub width: u32,
}

impl Shape {
    pub fn new(num: u32, channels: u32, height: u32, width: u32) -> Self {
        Self { num, channels, height, width }
    }

    /// Total number of elements.
    pub fn volume(&self) -> usize {
        self.num as usize * self.sample_volume()
    }

    /// Number of elements in one sample (`channels * height * width`).
    pub fn sample_volume(&self) -> usize {
        self.channels as usize * self.height as usize * self.width as usize
    }

    /// Whether height and width are both resolved (nonzero).
    pub fn is_resolved(&self) -> bool {
        self.height > 0 && self.width > 0
    }
}
