//! End-to-end tests for the fixed-size pipeline.
//!
//! Tests cover:
//! - Center crop extracts the exact center block (test phase)
//! - Mean subtraction and scaling arithmetic
//! - Per-pixel mean indexing at absolute pre-crop coordinates
//! - Shape inference agreeing with the values actually produced
//! - Encoded samples matching the equivalent raw sample
//! - Configuration errors surfacing as `InvalidConfig`

mod common;
use common::{encoded_gradient, indexed_sample, three_channel_sample, transformer};

use anyhow::Result;
use data_augmentation::{
    MeanBlob, Phase, Sample, Shape, TransformConfig, TransformError,
};

// ============================================================================
// Cropping
// ============================================================================

#[test]
fn test_center_crop_extracts_center_block() -> Result<()> {
    let config = TransformConfig::builder().crop_size(2).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(4, 4);

    let mut out = vec![0.0f32; 4];
    t.transform(&sample, &mut out, Shape::new(1, 1, 2, 2))?;
    assert_eq!(out, vec![5.0, 6.0, 9.0, 10.0]);
    Ok(())
}

#[test]
fn test_crop_equal_to_size_copies_everything() -> Result<()> {
    let config = TransformConfig::builder().crop_size(3).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(3, 3);

    let mut out = vec![0.0f32; 9];
    t.transform(&sample, &mut out, Shape::new(1, 1, 3, 3))?;
    let expected: Vec<f32> = (0..9).map(|v| v as f32).collect();
    assert_eq!(out, expected);
    Ok(())
}

#[test]
fn test_train_crop_stays_within_bounds() -> Result<()> {
    let config = TransformConfig::builder().crop_size(2).random_seed(7).build()?;
    let mut t = transformer(config, Phase::Train);
    let sample = indexed_sample(5, 5);

    for _ in 0..20 {
        let mut out = vec![0.0f32; 4];
        t.transform(&sample, &mut out, Shape::new(1, 1, 2, 2))?;
        // every value must come from the 5x5 source, and rows must be
        // horizontally adjacent source pixels
        assert!(out.iter().all(|&v| (0.0..25.0).contains(&v)));
        assert_eq!(out[1] - out[0], 1.0);
        assert_eq!(out[2] - out[0], 5.0);
    }
    Ok(())
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_mean_values_and_scale() -> Result<()> {
    let config = TransformConfig::builder()
        .mean_values(vec![10.0])
        .scale(2.0)
        .build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(2, 2);

    let mut out = vec![0.0f32; 4];
    t.transform(&sample, &mut out, Shape::new(1, 1, 2, 2))?;
    // (pixel - 10) * 2
    assert_eq!(out, vec![-20.0, -18.0, -16.0, -14.0]);
    Ok(())
}

#[test]
fn test_single_mean_value_broadcasts_to_all_channels() -> Result<()> {
    let sample = three_channel_sample(2, 2);
    let shape = Shape::new(1, 3, 2, 2);

    let broadcast = TransformConfig::builder().mean_values(vec![10.0]).build()?;
    let explicit = TransformConfig::builder().mean_values(vec![10.0, 10.0, 10.0]).build()?;

    let mut out_a = vec![0.0f32; 12];
    let mut out_b = vec![0.0f32; 12];
    transformer(broadcast, Phase::Test).transform(&sample, &mut out_a, shape)?;
    transformer(explicit, Phase::Test).transform(&sample, &mut out_b, shape)?;
    assert_eq!(out_a, out_b);
    Ok(())
}

#[test]
fn test_mean_file_uses_absolute_precrop_coordinates() -> Result<()> {
    // the mean equals the sample pixel-for-pixel, so the output must be
    // all zeros no matter which crop window gets drawn
    let mean = MeanBlob::new(1, 6, 6, (0..36).map(|v| v as f32).collect())?;
    let config = TransformConfig::builder()
        .crop_size(3)
        .mean_file(mean)
        .random_seed(11)
        .build()?;
    let mut t = transformer(config, Phase::Train);
    let sample = indexed_sample(6, 6);

    for _ in 0..10 {
        let mut out = vec![1.0f32; 9];
        t.transform(&sample, &mut out, Shape::new(1, 1, 3, 3))?;
        assert!(out.iter().all(|&v| v == 0.0));
    }
    Ok(())
}

#[test]
fn test_mean_file_dimension_mismatch_is_rejected() -> Result<()> {
    let mean = MeanBlob::new(1, 3, 3, vec![0.0; 9])?;
    let config = TransformConfig::builder().mean_file(mean).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(4, 4);

    let mut out = vec![0.0f32; 16];
    let err = t.transform(&sample, &mut out, Shape::new(1, 1, 4, 4)).unwrap_err();
    assert!(matches!(err, TransformError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn test_float_samples_skip_byte_quantization() -> Result<()> {
    let config = TransformConfig::builder().scale(0.5).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = Sample::from_floats(1, 1, 2, vec![0.5, -3.0])?;

    let mut out = vec![0.0f32; 2];
    t.transform(&sample, &mut out, Shape::new(1, 1, 1, 2))?;
    assert_eq!(out, vec![0.25, -1.5]);
    Ok(())
}

// ============================================================================
// Shape inference
// ============================================================================

#[test]
fn test_inferred_shape_matches_produced_output() -> Result<()> {
    let config = TransformConfig::builder().crop_size(2).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(4, 4);

    let sample_shape = t.infer_sample_shape(&sample)?;
    assert_eq!(sample_shape, Shape::new(1, 1, 4, 4));

    let out_shape = t.infer_output_shape(sample_shape, false)?;
    assert_eq!(out_shape, Shape::new(1, 1, 2, 2));

    let mut out = vec![0.0f32; out_shape.sample_volume()];
    t.transform(&sample, &mut out, out_shape)?;
    Ok(())
}

#[test]
fn test_encoded_sample_shape_comes_from_decoding() -> Result<()> {
    let config = TransformConfig::builder().build()?;
    let t = transformer(config, Phase::Test);
    let sample = encoded_gradient(5, 7);
    assert_eq!(t.infer_sample_shape(&sample)?, Shape::new(1, 1, 5, 7));
    Ok(())
}

// ============================================================================
// Encoded samples
// ============================================================================

#[test]
fn test_encoded_path_matches_raw_path() -> Result<()> {
    // a PNG round-trips losslessly, so the decoded path must produce the
    // same center crop as the equivalent raw sample
    let config = TransformConfig::builder().crop_size(2).build()?;
    let mut t_raw = transformer(config.clone(), Phase::Test);
    let mut t_enc = transformer(config, Phase::Test);

    let raw = indexed_sample(4, 4);
    let encoded = encoded_gradient(4, 4);
    let shape = Shape::new(1, 1, 2, 2);

    let mut out_raw = vec![0.0f32; 4];
    let mut out_enc = vec![0.0f32; 4];
    t_raw.transform(&raw, &mut out_raw, shape)?;
    t_enc.transform(&encoded, &mut out_enc, shape)?;
    assert_eq!(out_raw, out_enc);
    Ok(())
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_crop_larger_than_sample_is_rejected() -> Result<()> {
    let config = TransformConfig::builder().crop_size(8).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(4, 4);

    let mut out = vec![0.0f32; 64];
    let err = t.transform(&sample, &mut out, Shape::new(1, 1, 8, 8)).unwrap_err();
    assert!(matches!(err, TransformError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn test_output_shape_mismatch_is_rejected() -> Result<()> {
    let config = TransformConfig::builder().crop_size(2).build()?;
    let mut t = transformer(config, Phase::Test);
    let sample = indexed_sample(4, 4);

    let mut out = vec![0.0f32; 9];
    let err = t.transform(&sample, &mut out, Shape::new(1, 1, 3, 3)).unwrap_err();
    assert!(matches!(err, TransformError::InvalidConfig(_)));
    Ok(())
}
