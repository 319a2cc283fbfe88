//! # data_augmentation
//!
//! A deterministic image augmentation and normalization pipeline: it turns
//! raw or encoded labeled samples into fixed-shape `f32` tensor regions,
//! applying configurable cropping, mirroring, mean subtraction, scaling,
//! and train-time photometric/geometric jitter.
//!
//! ## Core components
//!
//! - [`TransformConfig`]: immutable options, validated at build time.
//! - [`Sample`] / [`SampleData`]: one labeled datum, raw planar bytes or
//!   floats, or an encoded image.
//! - [`TransformRng`] / [`RandomDraws`]: the seeded draw sequencer and the
//!   fixed-arity per-sample triple it produces.
//! - [`DataTransformer`]: the pipeline itself; one instance per worker.
//! - [`OutputTensor`]: a caller-owned NCHW buffer partitioned into disjoint
//!   per-sample regions by the batch driver.
//!
//! ## Usage
//!
//! ```ignore
//! use data_augmentation::{
//!     DataTransformer, OutputTensor, Phase, Sample, SeedCounter, Shape, TransformConfig,
//! };
//!
//! let config = TransformConfig::builder()
//!     .crop_size(224)
//!     .mirror(true)
//!     .mean_values(vec![104.0, 117.0, 123.0])
//!     .random_seed(42)
//!     .build()?;
//!
//! let seeds = SeedCounter::default();
//! let mut transformer = DataTransformer::new(config, Phase::Train, &seeds)?;
//!
//! let sample_shape = transformer.infer_sample_shape(&samples[0])?;
//! let out_shape = transformer.infer_output_shape(sample_shape, false)?;
//!
//! let mut buf = vec![0.0f32; samples.len() * out_shape.sample_volume()];
//! let batch_shape = Shape::new(samples.len() as u32, out_shape.channels,
//!                              out_shape.height, out_shape.width);
//! let mut out = OutputTensor::new(&mut buf, batch_shape)?;
//! transformer.transform_batch(&samples, &mut out, None)?;
//! # Ok::<(), data_augmentation::TransformError>(())
//! ```
//!
//! Determinism contract: with a fixed seed and configuration, repeated runs
//! over the same samples in the same order produce bit-identical outputs.
//! Sharing one transformer across threads would break that contract, so
//! each worker owns its own instance, seeded through a shared
//! [`SeedCounter`].

pub mod config;
pub mod decode;
#[cfg(feature = "cuda")]
pub mod device;
pub mod error;
pub mod ops;
pub mod rng;
pub mod sample;
pub mod shape;
pub mod tensor;
pub mod transformer;

pub use config::{MeanBlob, MeanMode, Phase, TransformConfig, TransformConfigBuilder};
pub use error::{Result, TransformError};
pub use rng::{RandomDraws, SeedCounter, SeedSource, TransformRng};
pub use sample::{Sample, SampleData};
pub use shape::Shape;
pub use tensor::OutputTensor;
pub use transformer::DataTransformer;
