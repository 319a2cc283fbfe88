//! src/transformer.rs
//!
//! The `DataTransformer` converts one raw labeled sample into a fixed-shape
//! numeric tensor region, applying the configured sequence of randomized
//! and deterministic transforms.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────┐
//!                  │ Sample │ (raw planar bytes/floats, or encoded)
//!                  └───┬────┘
//!                      │ encoded samples only
//!                      ↓
//!               ┌──────────────┐
//!               │ Decode       │ (image codec adapter)
//!               └──────┬───────┘
//!                      ↓
//!            ┌───────────────────┐
//!            │ Variable-sized    │ (optional: random resize →
//!            │ pipeline          │  random crop / center crop)
//!            └─────────┬─────────┘
//!                      ↓
//!               ┌──────────────┐
//!               │ TransformRng │ (fixed-order seeded draws)
//!               └──────┬───────┘
//!                      ↓
//!       ┌──────────────────────────────┐
//!       │ Fixed-size pipeline          │ rotation, resize, jitter,
//!       │ (host) or device offload     │ crop, mirror, mean, scale
//!       └──────────────┬───────────────┘
//!                      ↓
//!              ┌───────────────┐
//!              │ OutputTensor  │ (caller-owned planar region)
//!              └───────────────┘
//! ```
//!
//! A transformer is stateless per call apart from its random sequencer, so
//! concurrent callers each own their own instance (or at minimum their own
//! sequencer) and no locking happens inside.

use crate::config::{MeanMode, Phase, TransformConfig};
use crate::decode::{decode_image, image_channels, image_to_planar_bytes, planar_bytes_to_image};
use crate::error::{ensure_config, Result, TransformError};
use crate::ops;
use crate::ops::SmoothKind;
use crate::rng::{RandomDraws, SeedSource, TransformRng};
use crate::sample::{Sample, SampleData};
use crate::shape::Shape;
use crate::tensor::OutputTensor;
use image::DynamicImage;

/// Per-instance augmentation pipeline.
#[derive(Debug)]
pub struct DataTransformer {
    pub(crate) config: TransformConfig,
    pub(crate) phase: Phase,
    rng: TransformRng,
}

impl DataTransformer {
    /// Builds a transformer for the given phase. A generator is created
    /// only when some enabled transform needs randomness, seeded from
    /// `config.random_seed` or, failing that, from the injected seed
    /// source.
    pub fn new(config: TransformConfig, phase: Phase, seeds: &dyn SeedSource) -> Result<Self> {
        if let MeanMode::File(blob) = &config.mean {
            let (channels, height, width) = blob.dimensions();
            tracing::info!(channels, height, width, "using pixel-wise mean reference");
        }
        let rng = if config.needs_randomness(phase) {
            let seed = config.random_seed.unwrap_or_else(|| seeds.next_seed());
            TransformRng::seeded(seed)
        } else {
            TransformRng::disabled()
        };
        Ok(Self { config, phase, rng })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Produces the per-sample draw triple. All three values are consumed
    /// from the generator whenever one exists, so toggling one transform
    /// never shifts the sequence seen by another; without a generator the
    /// triple is all zeros (nothing would read it).
    pub fn fill_randoms(&mut self) -> Result<RandomDraws> {
        if self.rng.is_active() {
            self.rng.draw_three()
        } else {
            Ok(RandomDraws::default())
        }
    }

    // ------------------------------------------------------------------
    // Shape inference
    // ------------------------------------------------------------------

    /// `(1, channels, height, width)` of the sample itself, decoding only
    /// the header information for encoded samples.
    pub fn infer_sample_shape(&self, sample: &Sample) -> Result<Shape> {
        match &sample.data {
            SampleData::Encoded(bytes) => {
                let img = decode_image(bytes, self.config.force_color, self.config.force_gray)?;
                Ok(Shape::new(1, image_channels(&img), img.height(), img.width()))
            }
            SampleData::Bytes { channels, height, width, .. }
            | SampleData::Floats { channels, height, width, .. } => {
                Ok(Shape::new(1, *channels, *height, *width))
            }
        }
    }

    /// Output shape for the fixed-size pipeline. The crop override applies
    /// unless `device_mode` is set: the device path defers cropping to its
    /// kernel and keeps the un-cropped dimensions.
    pub fn infer_output_shape(&self, sample_shape: Shape, device_mode: bool) -> Result<Shape> {
        let crop = self.config.crop_size;
        ensure_config!(sample_shape.channels > 0, "sample must have at least one channel");
        ensure_config!(
            sample_shape.height >= crop && sample_shape.width >= crop,
            "crop size {} exceeds sample dimensions {}x{}",
            crop,
            sample_shape.height,
            sample_shape.width
        );
        let (height, width) = if device_mode || crop == 0 {
            (sample_shape.height, sample_shape.width)
        } else {
            (crop, crop)
        };
        Ok(Shape::new(1, sample_shape.channels, height, width))
    }

    /// Output shape of the variable-sized pipeline: resize → random crop →
    /// center crop, enablement derived purely from configuration and phase.
    pub fn infer_variable_sized_shape(&self, sample_shape: Shape) -> Result<Shape> {
        let mut shape = Shape::new(1, sample_shape.channels, sample_shape.height, sample_shape.width);
        if self.config.rand_resize_enabled() {
            // A random resize by itself produces a variable-sized image; it
            // must be terminated by a crop to yield a concrete shape.
            shape.height = 0;
            shape.width = 0;
        }
        if self.random_crop_enabled() || self.center_crop_enabled() {
            shape.height = self.config.crop_size;
            shape.width = self.config.crop_size;
        }
        ensure_config!(
            shape.is_resolved(),
            "variable sized transform has unresolved output dimensions; did you forget to crop?"
        );
        Ok(shape)
    }

    // ------------------------------------------------------------------
    // Variable-sized pipeline
    // ------------------------------------------------------------------

    fn random_crop_enabled(&self) -> bool {
        self.phase == Phase::Train && self.config.crop_size > 0
    }

    fn center_crop_enabled(&self) -> bool {
        self.phase == Phase::Test && self.config.crop_size > 0
    }

    /// Applies resize → random crop → center crop in place, rewriting the
    /// sample's payload as raw planar bytes.
    pub fn variable_sized_transforms(&mut self, sample: &mut Sample) -> Result<()> {
        let mut img = match &sample.data {
            SampleData::Encoded(bytes) => {
                decode_image(bytes, self.config.force_color, self.config.force_gray)?
            }
            SampleData::Bytes { channels, height, width, data } => {
                planar_bytes_to_image(*channels, *height, *width, data)?
            }
            SampleData::Floats { .. } => {
                return Err(TransformError::unsupported(
                    "variable-sized transforms require 8-bit image data",
                ))
            }
        };
        if self.config.rand_resize_enabled() {
            img = self.random_resize(img)?;
        }
        if self.random_crop_enabled() {
            img = self.random_crop(img)?;
        }
        if self.center_crop_enabled() {
            img = Self::center_crop(img, self.config.crop_size)?;
        }
        let (channels, height, width, data) = image_to_planar_bytes(&img);
        sample.data = SampleData::Bytes { channels, height, width, data };
        Ok(())
    }

    /// Draws a short-side target in `[lower, upper]` and rescales: area
    /// interpolation when downscaling, cubic when upscaling, no-op when
    /// the size is unchanged.
    fn random_resize(&mut self, img: DynamicImage) -> Result<DynamicImage> {
        let target =
            self.rng.uniform_u32(self.config.rand_resize_lower, self.config.rand_resize_upper)?;
        let (width, height) = (img.width(), img.height());
        let scale = target as f64 / height.min(width) as f64;
        let new_height = (scale * height as f64).round() as u32;
        let new_width = (scale * width as f64).round() as u32;
        tracing::debug!(target, new_width, new_height, "random resize");
        if new_height < height || new_width < width {
            if new_height > height || new_width > width {
                return Err(TransformError::internal(format!(
                    "random resize computed a mixed scale: ({width}, {height}) => ({new_width}, {new_height})"
                )));
            }
            Ok(ops::resize_area(&img, new_width, new_height))
        } else if new_height > height || new_width > width {
            Ok(ops::resize_cubic(&img, new_width, new_height))
        } else {
            Ok(img)
        }
    }

    fn random_crop(&mut self, img: DynamicImage) -> Result<DynamicImage> {
        let crop = self.config.crop_size;
        let (width, height) = (img.width(), img.height());
        ensure_config!(
            height >= crop && width >= crop,
            "crop size {} exceeds image dimensions {}x{}",
            crop,
            height,
            width
        );
        let h_off = self.rng.uniform_u32(0, height - crop)?;
        let w_off = self.rng.uniform_u32(0, width - crop)?;
        Ok(ops::crop(&img, w_off, h_off, crop, crop))
    }

    fn center_crop(img: DynamicImage, crop: u32) -> Result<DynamicImage> {
        let (width, height) = (img.width(), img.height());
        ensure_config!(
            height >= crop && width >= crop,
            "crop size {} exceeds image dimensions {}x{}",
            crop,
            height,
            width
        );
        let h_off = (height - crop) / 2;
        let w_off = (width - crop) / 2;
        Ok(ops::crop(&img, w_off, h_off, crop, crop))
    }

    // ------------------------------------------------------------------
    // Fixed-size pipeline
    // ------------------------------------------------------------------

    /// Transforms one sample into the caller's output region, drawing its
    /// own randoms. Encoded samples go through the decoded-image path; raw
    /// samples through the direct path.
    pub fn transform(&mut self, sample: &Sample, out: &mut [f32], out_shape: Shape) -> Result<()> {
        match &sample.data {
            SampleData::Encoded(bytes) => {
                let img = decode_image(bytes, self.config.force_color, self.config.force_gray)?;
                self.transform_image(img, out, out_shape)
            }
            _ => {
                if self.config.force_color || self.config.force_gray {
                    tracing::warn!("force_color and force_gray apply to encoded samples only");
                }
                let draws = self.fill_randoms()?;
                self.transform_with_draws(sample, &draws, out, out_shape)
            }
        }
    }

    /// The raw-datum path: crop offsets and the mirror bit come from a
    /// previously drawn triple, so batches replay identically no matter
    /// which execution path consumes them.
    pub fn transform_with_draws(
        &self,
        sample: &Sample,
        draws: &RandomDraws,
        out: &mut [f32],
        out_shape: Shape,
    ) -> Result<()> {
        let (channels, src_height, src_width) = sample.raw_dimensions().ok_or_else(|| {
            TransformError::unsupported("encoded samples must use the decoded-image path")
        })?;
        let crop = self.config.crop_size;
        ensure_config!(channels > 0, "sample must have at least one channel");
        ensure_config!(
            src_height >= crop && src_width >= crop,
            "crop size {} exceeds sample dimensions {}x{}",
            crop,
            src_height,
            src_width
        );

        let (out_height, out_width) =
            if crop > 0 { (crop, crop) } else { (src_height, src_width) };
        ensure_config!(
            out_shape.channels == channels
                && out_shape.height == out_height
                && out_shape.width == out_width,
            "output shape {:?} does not match expected ({}, {}, {})",
            out_shape,
            channels,
            out_height,
            out_width
        );
        ensure_config!(
            out.len() == out_shape.sample_volume(),
            "output region length {} does not match shape volume {}",
            out.len(),
            out_shape.sample_volume()
        );

        let do_mirror = self.config.mirror && draws.mirror % 2 == 1;
        let (h_off, w_off) = if crop > 0 {
            match self.phase {
                Phase::Train => (
                    draws.offset_h % (src_height - crop + 1),
                    draws.offset_w % (src_width - crop + 1),
                ),
                Phase::Test => ((src_height - crop) / 2, (src_width - crop) / 2),
            }
        } else {
            (0, 0)
        };

        let (mean_file, mean_values) =
            self.resolve_mean(channels, src_height, src_width)?;
        let scale = self.config.scale;

        match &sample.data {
            SampleData::Bytes { data, .. } => {
                let source = |c: u32, index: usize| {
                    let pixel = data[index] as f32;
                    if let Some(mean) = mean_file {
                        pixel - mean[index]
                    } else if let Some(values) = mean_values {
                        pixel - MeanMode::value_for_channel(values, c)
                    } else {
                        pixel
                    }
                };
                if scale == 1.0 {
                    Self::copy_region(
                        out, channels, out_height, out_width, src_height, src_width, h_off,
                        w_off, do_mirror, source, |v| v,
                    );
                } else {
                    Self::copy_region(
                        out, channels, out_height, out_width, src_height, src_width, h_off,
                        w_off, do_mirror, source, |v| v * scale,
                    );
                }
            }
            SampleData::Floats { data, .. } => {
                let source = |c: u32, index: usize| {
                    let pixel = data[index];
                    if let Some(mean) = mean_file {
                        pixel - mean[index]
                    } else if let Some(values) = mean_values {
                        pixel - MeanMode::value_for_channel(values, c)
                    } else {
                        pixel
                    }
                };
                if scale == 1.0 {
                    Self::copy_region(
                        out, channels, out_height, out_width, src_height, src_width, h_off,
                        w_off, do_mirror, source, |v| v,
                    );
                } else {
                    Self::copy_region(
                        out, channels, out_height, out_width, src_height, src_width, h_off,
                        w_off, do_mirror, source, |v| v * scale,
                    );
                }
            }
            SampleData::Encoded(_) => {
                return Err(TransformError::internal(
                    "encoded sample reached the raw transform path",
                ))
            }
        }
        Ok(())
    }

    /// The decoded-image path: rotation, short-side resize, color jitter,
    /// final crop, mirror, mean subtraction and scale.
    pub fn transform_image(
        &mut self,
        img: DynamicImage,
        out: &mut [f32],
        out_shape: Shape,
    ) -> Result<()> {
        let train = self.phase == Phase::Train;
        let apply_prob = 1.0 - self.config.apply_probability;

        let do_rotation = train && self.config.max_rotation_angle > 0;
        let do_min_side = self.config.min_side > 0;
        let do_min_side_range = self.config.min_side_min > 0 && self.config.min_side_max > 0;
        let do_mirror = self.config.mirror && train && self.rng.rand_index(2)? == 1;

        // The three stage probabilities are drawn whenever a generator
        // exists, in a fixed order, regardless of which stages are enabled.
        let (p_brightness, p_smooth, p_shift) = if self.rng.is_active() {
            (
                self.rng.uniform_f32(0.0, 1.0)?,
                self.rng.uniform_f32(0.0, 1.0)?,
                self.rng.uniform_f32(0.0, 1.0)?,
            )
        } else {
            (0.0, 0.0, 0.0)
        };
        let do_brightness = self.config.contrast_brightness && train && p_brightness > apply_prob;
        let do_smooth = self.config.smooth_filtering
            && train
            && self.config.max_smooth > 1
            && p_smooth > apply_prob;
        let do_color_shift = self.config.max_color_shift > 0 && train && p_shift > apply_prob;

        let mut img = img;

        if do_rotation {
            let max = self.config.max_rotation_angle;
            let angle = self.rng.rand_index(max * 2 + 1)? as i32 - max as i32;
            tracing::debug!(angle, "rotation");
            if angle != 0 {
                img = ops::rotate_expanded(&img, angle);
            }
        }

        if do_min_side {
            img = ops::resize_min_side(&img, self.config.min_side);
        }
        if do_min_side_range {
            let span = self.config.min_side_max - self.config.min_side_min + 1;
            let side = self.config.min_side_min + self.rng.rand_index(span)?;
            tracing::debug!(side, "short-side resize");
            img = ops::resize_min_side(&img, side);
        }

        if do_color_shift {
            let bound = self.config.max_color_shift + 1;
            let shifts = [
                self.rng.rand_index(bound)?,
                self.rng.rand_index(bound)?,
                self.rng.rand_index(bound)?,
            ];
            let subtract = self.rng.rand_index(2)? == 1;
            tracing::debug!(?shifts, subtract, "channel shift");
            ops::channel_shift(&mut img, shifts, subtract);
        }

        if do_brightness {
            let alpha =
                self.rng.uniform_f32(self.config.min_contrast, self.config.max_contrast)?;
            let max_shift = self.config.max_brightness_shift;
            let beta = self.rng.rand_index(max_shift * 2 + 1)? as i32 - max_shift as i32;
            tracing::debug!(alpha, beta, "contrast/brightness adjustment");
            ops::contrast_brightness(&mut img, alpha, beta);
        }

        if do_smooth {
            let kind = SmoothKind::from_index(self.rng.rand_index(4)?);
            let kernel = 1 + 2 * self.rng.rand_index(self.config.max_smooth / 2)?;
            tracing::debug!(?kind, kernel, "smooth filtering");
            img = ops::smooth(&img, kind, kernel);
        }

        let channels = image_channels(&img);
        let (img_width, img_height) = (img.width(), img.height());
        let crop = self.config.crop_size;
        ensure_config!(
            img_height >= crop && img_width >= crop,
            "crop size {} exceeds image dimensions {}x{}",
            crop,
            img_height,
            img_width
        );
        let (out_height, out_width) =
            if crop > 0 { (crop, crop) } else { (img_height, img_width) };
        ensure_config!(
            out_shape.channels == channels
                && out_shape.height == out_height
                && out_shape.width == out_width,
            "output shape {:?} does not match expected ({}, {}, {})",
            out_shape,
            channels,
            out_height,
            out_width
        );
        ensure_config!(
            out.len() == out_shape.sample_volume(),
            "output region length {} does not match shape volume {}",
            out.len(),
            out_shape.sample_volume()
        );

        let (h_off, w_off) = if crop > 0 {
            if train {
                (
                    self.rng.rand_index(img_height - crop + 1)?,
                    self.rng.rand_index(img_width - crop + 1)?,
                )
            } else {
                ((img_height - crop) / 2, (img_width - crop) / 2)
            }
        } else {
            (0, 0)
        };
        let cropped = if crop > 0 { ops::crop(&img, w_off, h_off, crop, crop) } else { img };

        // The mean reference must match the image as it stood before the
        // final crop, after any rotation or resize.
        let (mean_file, mean_values) = self.resolve_mean(channels, img_height, img_width)?;

        let bytes = cropped.as_bytes();
        let scale = self.config.scale;
        if scale == 1.0 {
            Self::copy_image_region(
                out, bytes, channels, out_height, out_width, img_height, img_width, h_off,
                w_off, do_mirror, mean_file, mean_values, |v| v,
            );
        } else {
            Self::copy_image_region(
                out, bytes, channels, out_height, out_width, img_height, img_width, h_off,
                w_off, do_mirror, mean_file, mean_values, |v| v * scale,
            );
        }
        Ok(())
    }

    /// Validates the configured mean source against the pre-crop sample
    /// dimensions and returns the resolved references.
    pub(crate) fn resolve_mean(
        &self,
        channels: u32,
        height: u32,
        width: u32,
    ) -> Result<(Option<&[f32]>, Option<&[f32]>)> {
        match &self.config.mean {
            MeanMode::File(blob) => {
                ensure_config!(
                    blob.dimensions() == (channels, height, width),
                    "mean reference dimensions {:?} do not match sample dimensions ({}, {}, {})",
                    blob.dimensions(),
                    channels,
                    height,
                    width
                );
                Ok((Some(blob.data()), None))
            }
            MeanMode::Values(values) => {
                ensure_config!(
                    values.len() == 1 || values.len() == channels as usize,
                    "specify either 1 mean value or as many as channels: {}",
                    channels
                );
                Ok((None, Some(values)))
            }
            MeanMode::None => Ok((None, None)),
        }
    }

    /// Planar-to-planar copy with crop offset, mirror, and a per-value map
    /// (monomorphized so the `scale == 1.0` path skips the multiply).
    #[allow(clippy::too_many_arguments)]
    fn copy_region<S, M>(
        out: &mut [f32],
        channels: u32,
        out_height: u32,
        out_width: u32,
        src_height: u32,
        src_width: u32,
        h_off: u32,
        w_off: u32,
        do_mirror: bool,
        source: S,
        map: M,
    ) where
        S: Fn(u32, usize) -> f32,
        M: Fn(f32) -> f32,
    {
        for c in 0..channels {
            for h in 0..out_height {
                for w in 0..out_width {
                    let src_index = ((c * src_height + h_off + h) as usize) * src_width as usize
                        + (w_off + w) as usize;
                    let dst_w = if do_mirror { out_width - 1 - w } else { w };
                    let dst_index =
                        ((c * out_height + h) as usize) * out_width as usize + dst_w as usize;
                    out[dst_index] = map(source(c, src_index));
                }
            }
        }
    }

    /// Interleaved-to-planar copy for the decoded path. Mean-file lookups
    /// use the absolute pre-crop coordinate of each pixel.
    #[allow(clippy::too_many_arguments)]
    fn copy_image_region<M>(
        out: &mut [f32],
        bytes: &[u8],
        channels: u32,
        out_height: u32,
        out_width: u32,
        img_height: u32,
        img_width: u32,
        h_off: u32,
        w_off: u32,
        do_mirror: bool,
        mean_file: Option<&[f32]>,
        mean_values: Option<&[f32]>,
        map: M,
    ) where
        M: Fn(f32) -> f32,
    {
        let ch = channels as usize;
        for h in 0..out_height {
            for w in 0..out_width {
                let base = ((h * out_width + w) as usize) * ch;
                let dst_w = if do_mirror { out_width - 1 - w } else { w };
                for c in 0..channels {
                    let pixel = bytes[base + c as usize] as f32;
                    let mean = if let Some(mean) = mean_file {
                        mean[((c * img_height + h_off + h) as usize) * img_width as usize
                            + (w_off + w) as usize]
                    } else if let Some(values) = mean_values {
                        MeanMode::value_for_channel(values, c)
                    } else {
                        0.0
                    };
                    let dst_index =
                        ((c * out_height + h) as usize) * out_width as usize + dst_w as usize;
                    out[dst_index] = map(pixel - mean);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Batch driver
    // ------------------------------------------------------------------

    /// Transforms each sample into its own disjoint sub-region of the
    /// output tensor, in order, each with its own independent draws.
    /// Scalar labels are copied into `labels` when provided.
    pub fn transform_batch(
        &mut self,
        samples: &[Sample],
        out: &mut OutputTensor<'_>,
        mut labels: Option<&mut [f32]>,
    ) -> Result<()> {
        ensure_config!(!samples.is_empty(), "there is no sample to transform");
        let num = out.shape().num as usize;
        ensure_config!(
            samples.len() <= num,
            "batch of {} samples exceeds output tensor num {}",
            samples.len(),
            num
        );
        if let Some(buf) = labels.as_deref() {
            ensure_config!(
                buf.len() >= samples.len(),
                "label buffer holds {} entries for {} samples",
                buf.len(),
                samples.len()
            );
        }

        let shape = out.shape();
        let sample_shape = Shape::new(1, shape.channels, shape.height, shape.width);
        for (index, sample) in samples.iter().enumerate() {
            self.transform(sample, out.sample_mut(index), sample_shape)?;
            if let Some(buf) = labels.as_deref_mut() {
                buf[index] = sample.label.unwrap_or(0.0);
            }
        }
        Ok(())
    }
}
