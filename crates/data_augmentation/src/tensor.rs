//! src/tensor.rs
//!
//! Caller-owned output tensor region.
//!
//! The pipeline only ever writes within the declared bounds and never
//! reallocates; the batch driver partitions the buffer into disjoint
//! per-sample sub-regions, so no synchronization between samples is needed.

use crate::error::{ensure_config, Result};
use crate::shape::Shape;

/// A borrowed contiguous `f32` buffer with a declared NCHW shape.
///
/// Planar channel-major layout within each sample:
/// `index = (c * height + h) * width + w`.
#[derive(Debug)]
pub struct OutputTensor<'a> {
    data: &'a mut [f32],
    shape: Shape,
}

impl<'a> OutputTensor<'a> {
    pub fn new(data: &'a mut [f32], shape: Shape) -> Result<Self> {
        ensure_config!(shape.num >= 1, "output tensor num must be at least 1");
        ensure_config!(
            data.len() == shape.volume(),
            "output buffer length {} does not match shape volume {}",
            data.len(),
            shape.volume()
        );
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Element offset of sample `index` within the buffer.
    pub fn offset(&self, index: usize) -> usize {
        index * self.shape.sample_volume()
    }

    /// The disjoint sub-region for sample `index`.
    pub fn sample_mut(&mut self, index: usize) -> &mut [f32] {
        let volume = self.shape.sample_volume();
        let start = index * volume;
        &mut self.data[start..start + volume]
    }
}
