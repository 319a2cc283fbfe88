//! src/config.rs
//!
//! Configuration for the augmentation pipeline.
//!
//! `TransformConfig` is a value object resolved once per pipeline instance
//! and immutable afterwards. It is built through a builder with validation
//! at `build()` time, so a transformer never starts from a contradictory
//! configuration.
//!
//! Example:
//! ```ignore
//! let config = TransformConfig::builder()
//!     .crop_size(224)
//!     .mirror(true)
//!     .mean_values(vec![104.0, 117.0, 123.0])
//!     .scale(1.0 / 255.0)
//!     .random_seed(42)
//!     .build()?;
//! ```

use crate::error::{ensure_config, Result};

/// TRAIN permits randomized transforms; TEST uses deterministic, centered
/// transforms only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Train,
    Test,
}

/// A per-pixel mean reference, already loaded by an external collaborator.
///
/// Its dimensions must exactly equal the per-sample pre-crop
/// `(channels, height, width)` at transform time. Stored in planar
/// channel-major layout like the samples it is subtracted from.
#[derive(Debug, Clone)]
pub struct MeanBlob {
    channels: u32,
    height: u32,
    width: u32,
    data: Vec<f32>,
}

impl MeanBlob {
    pub fn new(channels: u32, height: u32, width: u32, data: Vec<f32>) -> Result<Self> {
        let expected = channels as usize * height as usize * width as usize;
        ensure_config!(
            data.len() == expected,
            "mean blob length {} does not match dimensions {}x{}x{}",
            data.len(),
            channels,
            height,
            width
        );
        Ok(Self { channels, height, width, data })
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.channels, self.height, self.width)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Baseline subtracted from every pixel before scaling.
#[derive(Debug, Clone, Default)]
pub enum MeanMode {
    /// No mean subtraction.
    #[default]
    None,
    /// Per-pixel mean at the same absolute pre-crop coordinate.
    File(MeanBlob),
    /// Per-channel scalars: length 1 (broadcast to all channels) or
    /// length == channels.
    Values(Vec<f32>),
}

impl MeanMode {
    /// Per-channel value lookup with length-1 broadcast. The list is never
    /// extended in place, so a config shared read-only across workers stays
    /// safe.
    pub(crate) fn value_for_channel(values: &[f32], channel: u32) -> f32 {
        if values.len() == 1 {
            values[0]
        } else {
            values[channel as usize]
        }
    }
}

/// Immutable set of recognized options, resolved once per pipeline instance.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Square crop edge; 0 disables cropping.
    pub crop_size: u32,
    /// Enables random horizontal mirroring.
    pub mirror: bool,
    /// Multiplier applied after mean subtraction (default 1.0; the multiply
    /// is skipped entirely when it is exactly 1.0).
    pub scale: f32,
    /// Mean subtraction source.
    pub mean: MeanMode,
    /// Random short-side resize bounds for the variable-sized pipeline;
    /// both zero disables the step, both nonzero enables it.
    pub rand_resize_lower: u32,
    pub rand_resize_upper: u32,
    /// Fixed short-side resize target for the decoded-image pipeline.
    pub min_side: u32,
    /// Drawn short-side resize bounds for the decoded-image pipeline.
    pub min_side_min: u32,
    pub min_side_max: u32,
    /// Maximum rotation magnitude in degrees; 0 disables rotation.
    pub max_rotation_angle: u32,
    /// Contrast/brightness jitter.
    pub contrast_brightness: bool,
    pub min_contrast: f32,
    pub max_contrast: f32,
    pub max_brightness_shift: u32,
    /// Smoothing jitter; kernel sizes drawn up to `max_smooth`.
    pub smooth_filtering: bool,
    pub max_smooth: u32,
    /// Per-channel constant shift jitter; 0 disables it.
    pub max_color_shift: u32,
    /// Probability that each enabled jitter stage fires for a given sample.
    pub apply_probability: f32,
    /// Decode forcing flags, mutually exclusive, encoded samples only.
    pub force_color: bool,
    pub force_gray: bool,
    /// Fixed seed for deterministic draws; `None` derives one from the
    /// injected [`crate::rng::SeedSource`].
    pub random_seed: Option<u64>,
}

impl TransformConfig {
    pub fn builder() -> TransformConfigBuilder {
        TransformConfigBuilder::default()
    }

    /// Whether the random short-side resize step is enabled. Bound pairing
    /// is validated at build time.
    pub(crate) fn rand_resize_enabled(&self) -> bool {
        self.rand_resize_lower != 0 && self.rand_resize_upper != 0
    }

    /// Whether any enabled transform needs randomness for the given phase.
    /// Only then does the transformer own a generator.
    pub(crate) fn needs_randomness(&self, phase: Phase) -> bool {
        // mirror, the random resize, and the drawn short-side resize all
        // draw in both phases
        if self.mirror
            || self.rand_resize_enabled()
            || (self.min_side_min > 0 && self.min_side_max > 0)
        {
            return true;
        }
        if phase != Phase::Train {
            return false;
        }
        self.crop_size > 0
            || self.max_rotation_angle > 0
            || self.contrast_brightness
            || self.smooth_filtering
            || self.max_color_shift > 0
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            crop_size: 0,
            mirror: false,
            scale: 1.0,
            mean: MeanMode::None,
            rand_resize_lower: 0,
            rand_resize_upper: 0,
            min_side: 0,
            min_side_min: 0,
            min_side_max: 0,
            max_rotation_angle: 0,
            contrast_brightness: false,
            min_contrast: 0.8,
            max_contrast: 1.2,
            max_brightness_shift: 5,
            smooth_filtering: false,
            max_smooth: 6,
            max_color_shift: 0,
            apply_probability: 0.5,
            force_color: false,
            force_gray: false,
            random_seed: None,
        }
    }
}

/// Builder for [`TransformConfig`] with method chaining.
#[derive(Default)]
pub struct TransformConfigBuilder {
    config: TransformConfig,
    mean_file: Option<MeanBlob>,
    mean_values: Vec<f32>,
}

impl TransformConfigBuilder {
    /// Set the square crop size (0 disables cropping).
    pub fn crop_size(mut self, size: u32) -> Self {
        self.config.crop_size = size;
        self
    }

    /// Enable random horizontal mirroring.
    pub fn mirror(mut self, mirror: bool) -> Self {
        self.config.mirror = mirror;
        self
    }

    /// Set the post-subtraction scale factor.
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    /// Use a per-pixel mean reference. Mutually exclusive with
    /// [`mean_values`](Self::mean_values).
    pub fn mean_file(mut self, blob: MeanBlob) -> Self {
        self.mean_file = Some(blob);
        self
    }

    /// Use per-channel mean scalars (length 1 broadcasts to all channels).
    /// Mutually exclusive with [`mean_file`](Self::mean_file).
    pub fn mean_values(mut self, values: Vec<f32>) -> Self {
        self.mean_values = values;
        self
    }

    /// Set random short-side resize bounds (variable-sized pipeline).
    /// Both must be zero or both nonzero.
    pub fn rand_resize(mut self, lower: u32, upper: u32) -> Self {
        self.config.rand_resize_lower = lower;
        self.config.rand_resize_upper = upper;
        self
    }

    /// Set a fixed short-side resize target (decoded-image pipeline).
    pub fn min_side(mut self, side: u32) -> Self {
        self.config.min_side = side;
        self
    }

    /// Set drawn short-side resize bounds (decoded-image pipeline).
    pub fn min_side_range(mut self, min: u32, max: u32) -> Self {
        self.config.min_side_min = min;
        self.config.min_side_max = max;
        self
    }

    /// Set the maximum rotation magnitude in degrees (train only).
    pub fn max_rotation_angle(mut self, degrees: u32) -> Self {
        self.config.max_rotation_angle = degrees;
        self
    }

    /// Enable contrast/brightness jitter: `pixel' = pixel * alpha + beta`
    /// with alpha in `[min_contrast, max_contrast]` and beta in
    /// `[-max_brightness_shift, max_brightness_shift]`.
    pub fn contrast_brightness(mut self, min_contrast: f32, max_contrast: f32, max_brightness_shift: u32) -> Self {
        self.config.contrast_brightness = true;
        self.config.min_contrast = min_contrast;
        self.config.max_contrast = max_contrast;
        self.config.max_brightness_shift = max_brightness_shift;
        self
    }

    /// Enable smoothing jitter with kernel sizes drawn up to `max_smooth`.
    pub fn smooth_filtering(mut self, max_smooth: u32) -> Self {
        self.config.smooth_filtering = true;
        self.config.max_smooth = max_smooth;
        self
    }

    /// Enable per-channel constant shift jitter up to `max_shift`.
    pub fn max_color_shift(mut self, max_shift: u32) -> Self {
        self.config.max_color_shift = max_shift;
        self
    }

    /// Set the per-stage jitter apply probability (default 0.5).
    pub fn apply_probability(mut self, p: f32) -> Self {
        self.config.apply_probability = p;
        self
    }

    /// Force encoded samples to decode as color.
    pub fn force_color(mut self, force: bool) -> Self {
        self.config.force_color = force;
        self
    }

    /// Force encoded samples to decode as grayscale.
    pub fn force_gray(mut self, force: bool) -> Self {
        self.config.force_gray = force;
        self
    }

    /// Fix the random seed for deterministic transforms.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Validate and build the final configuration.
    pub fn build(mut self) -> Result<TransformConfig> {
        ensure_config!(
            !(self.config.force_color && self.config.force_gray),
            "cannot set both force_color and force_gray"
        );
        ensure_config!(
            !(self.mean_file.is_some() && !self.mean_values.is_empty()),
            "cannot specify mean_file and mean_values at the same time"
        );
        ensure_config!(
            (self.config.rand_resize_lower == 0) == (self.config.rand_resize_upper == 0),
            "random resize 'lower' and 'upper' parameters must either both be zero or both be nonzero"
        );
        ensure_config!(
            self.config.rand_resize_lower <= self.config.rand_resize_upper,
            "random resize lower bound {} exceeds upper bound {}",
            self.config.rand_resize_lower,
            self.config.rand_resize_upper
        );
        if self.config.min_side_min > 0 || self.config.min_side_max > 0 {
            ensure_config!(
                self.config.min_side_min > 0 && self.config.min_side_min <= self.config.min_side_max,
                "min_side range [{}, {}] is not a valid interval",
                self.config.min_side_min,
                self.config.min_side_max
            );
        }
        if self.config.contrast_brightness {
            ensure_config!(
                self.config.min_contrast <= self.config.max_contrast,
                "min_contrast {} exceeds max_contrast {}",
                self.config.min_contrast,
                self.config.max_contrast
            );
        }
        ensure_config!(
            (0.0..=1.0).contains(&self.config.apply_probability),
            "apply_probability must be in [0.0, 1.0] (got {})",
            self.config.apply_probability
        );

        self.config.mean = match (self.mean_file.take(), std::mem::take(&mut self.mean_values)) {
            (Some(blob), _) => MeanMode::File(blob),
            (None, values) if !values.is_empty() => MeanMode::Values(values),
            _ => MeanMode::None,
        };
        Ok(self.config)
    }
}
