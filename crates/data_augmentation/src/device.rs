//! src/device.rs
//!
//! Device offload for the fixed-size pipeline, behind the `cuda` feature.
//!
//! The host still draws the per-sample randoms; this path only moves the
//! numeric work (crop, mirror, mean subtraction, scaling) onto the
//! destination tensor's device. Cropping becomes a pair of `narrow` views
//! so only the normalized crop is ever written to the destination.
//!
//! Ordering matters for bit-parity with the host path: the host writes
//! `out[mirrored_w] = (pixel[w] - mean[w]) * scale`, i.e. the mirror flips
//! the already-normalized image. The flip is therefore applied last here,
//! after mean subtraction and scaling at un-mirrored coordinates.
//!
//! Encoded samples are decoded on the host first; codecs stay off-device.

use crate::config::{MeanMode, Phase};
use crate::decode::{decode_image, image_to_planar_bytes};
use crate::error::{ensure_config, Result};
use crate::rng::RandomDraws;
use crate::sample::{Sample, SampleData};
use crate::transformer::DataTransformer;
use tch::Tensor;

impl DataTransformer {
    /// Transforms one sample directly into a device-resident tensor of
    /// shape `[channels, crop, crop]` (or the full sample dimensions when
    /// cropping is disabled), using a previously drawn triple.
    pub fn transform_device(
        &self,
        sample: &Sample,
        dst: &mut Tensor,
        draws: &RandomDraws,
    ) -> Result<()> {
        let (channels, height, width, host): (u32, u32, u32, Vec<f32>) = match &sample.data {
            SampleData::Bytes { channels, height, width, data } => {
                (*channels, *height, *width, data.iter().map(|&b| b as f32).collect())
            }
            SampleData::Floats { channels, height, width, data } => {
                (*channels, *height, *width, data.clone())
            }
            SampleData::Encoded(bytes) => {
                let img = decode_image(bytes, self.config.force_color, self.config.force_gray)?;
                let (c, h, w, data) = image_to_planar_bytes(&img);
                (c, h, w, data.iter().map(|&b| b as f32).collect())
            }
        };

        let crop = self.config.crop_size;
        ensure_config!(
            height >= crop && width >= crop,
            "crop size {} exceeds sample dimensions {}x{}",
            crop,
            height,
            width
        );
        let (out_height, out_width) = if crop > 0 { (crop, crop) } else { (height, width) };
        let expected = [channels as i64, out_height as i64, out_width as i64];
        ensure_config!(
            dst.size() == expected,
            "destination tensor shape {:?} does not match expected {:?}",
            dst.size(),
            expected
        );

        let do_mirror = self.config.mirror && draws.mirror % 2 == 1;
        let (h_off, w_off) = if crop > 0 {
            match self.phase {
                Phase::Train => (
                    draws.offset_h % (height - crop + 1),
                    draws.offset_w % (width - crop + 1),
                ),
                Phase::Test => ((height - crop) / 2, (width - crop) / 2),
            }
        } else {
            (0, 0)
        };

        let device = dst.device();
        let staged = Tensor::from_slice(&host)
            .view([channels as i64, height as i64, width as i64])
            .to_device(device);
        let mut view = staged
            .narrow(1, h_off as i64, out_height as i64)
            .narrow(2, w_off as i64, out_width as i64);

        let (mean_file, mean_values) = self.resolve_mean(channels, height, width)?;
        if let Some(mean) = mean_file {
            let mean = Tensor::from_slice(mean)
                .view([channels as i64, height as i64, width as i64])
                .to_device(device)
                .narrow(1, h_off as i64, out_height as i64)
                .narrow(2, w_off as i64, out_width as i64);
            view = view - mean;
        } else if let Some(values) = mean_values {
            let per_channel: Vec<f32> =
                (0..channels).map(|c| MeanMode::value_for_channel(values, c)).collect();
            let mean = Tensor::from_slice(&per_channel)
                .view([channels as i64, 1, 1])
                .to_device(device);
            view = view - mean;
        }

        let scale = self.config.scale;
        if scale != 1.0 {
            view = view * scale as f64;
        }
        if do_mirror {
            view = view.flip([2i64]);
        }
        dst.copy_(&view);
        if let tch::Device::Cuda(index) = device {
            tch::Cuda::synchronize(index as i64);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformConfig;
    use crate::rng::SeedCounter;
    use crate::shape::Shape;

    // The device path runs unchanged on the CPU backend, which is what
    // these tests use; parity against the host path is the whole contract.
    #[test]
    fn test_device_path_matches_host_path() -> Result<()> {
        let config = TransformConfig::builder()
            .crop_size(2)
            .mirror(true)
            .mean_values(vec![10.0, 20.0, 30.0])
            .scale(0.5)
            .random_seed(42)
            .build()?;
        let t = DataTransformer::new(config, Phase::Train, &SeedCounter::default())?;

        let data: Vec<u8> = (0u8..48).collect();
        let sample = Sample::from_bytes(3, 4, 4, data)?;
        let draws = RandomDraws { mirror: 1, offset_h: 1, offset_w: 2 };

        let mut host = vec![0.0f32; 3 * 2 * 2];
        t.transform_with_draws(&sample, &draws, &mut host, Shape::new(1, 3, 2, 2))?;

        let mut dst = Tensor::zeros([3, 2, 2], (tch::Kind::Float, tch::Device::Cpu));
        t.transform_device(&sample, &mut dst, &draws)?;

        let flat = dst.flatten(0, -1);
        let device_out: Vec<f32> = Vec::<f32>::try_from(&flat).unwrap();
        assert_eq!(host, device_out);
        Ok(())
    }

    #[test]
    fn test_device_path_rejects_wrong_destination_shape() -> Result<()> {
        let config = TransformConfig::builder().crop_size(2).build()?;
        let t = DataTransformer::new(config, Phase::Test, &SeedCounter::default())?;
        let sample = Sample::from_bytes(1, 4, 4, vec![0; 16])?;
        let mut dst = Tensor::zeros([1, 3, 3], (tch::Kind::Float, tch::Device::Cpu));
        let err = t
            .transform_device(&sample, &mut dst, &RandomDraws::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::TransformError::InvalidConfig(_)));
        Ok(())
    }
}
