//! src/rng.rs
//!
//! The random draw sequencer.
//!
//! Determinism contract: for a fixed seed and a fixed configuration,
//! repeated runs over the same samples in the same order produce
//! bit-identical draw sequences. To keep that property stable across
//! configuration toggles, [`TransformRng::draw_three`] always consumes
//! exactly three values in a fixed order (mirror, height offset, width
//! offset), even when some of them go unused.
//!
//! A sequencer is single-owner state: concurrent callers must each own
//! their own `TransformRng` (draw order determinism is defined
//! per-sequencer, not globally).

use crate::error::{Result, TransformError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of seeds for pipelines that were not given an explicit seed.
///
/// Passed in at construction rather than read from a hidden global, so a
/// pipeline instance stays independently seedable for reproducibility.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

/// A monotonically advancing counter, the default [`SeedSource`].
///
/// Each pipeline constructed against the same counter gets a distinct,
/// reproducible seed.
#[derive(Debug, Default)]
pub struct SeedCounter(AtomicU64);

impl SeedCounter {
    pub fn new(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }
}

impl SeedSource for SeedCounter {
    fn next_seed(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// The fixed-arity random tuple consumed by one transform call.
///
/// Created immediately before a transform call and discarded after. The
/// mirror decision uses the parity of `mirror`; crop offsets are reduced
/// modulo the valid offset range by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomDraws {
    pub mirror: u32,
    pub offset_h: u32,
    pub offset_w: u32,
}

/// Seeded generator owned by one pipeline instance.
#[derive(Debug)]
pub struct TransformRng {
    rng: Option<StdRng>,
}

impl TransformRng {
    /// A sequencer with no generator. Any draw request fails with
    /// [`TransformError::Precondition`].
    pub fn disabled() -> Self {
        Self { rng: None }
    }

    /// A sequencer seeded for deterministic draws.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Some(StdRng::seed_from_u64(seed)) }
    }

    pub fn is_active(&self) -> bool {
        self.rng.is_some()
    }

    fn generator(&mut self) -> Result<&mut StdRng> {
        self.rng.as_mut().ok_or_else(|| {
            TransformError::Precondition(
                "random draw requested but no generator was initialized".into(),
            )
        })
    }

    /// Draws the per-sample triple: mirror bit, height offset, width offset.
    ///
    /// All three values are always drawn so that toggling one transform
    /// does not change the sequence consumed by another.
    pub fn draw_three(&mut self) -> Result<RandomDraws> {
        let rng = self.generator()?;
        Ok(RandomDraws {
            mirror: rng.random::<u32>(),
            offset_h: rng.random::<u32>(),
            offset_w: rng.random::<u32>(),
        })
    }

    /// Draws one raw 32-bit value.
    pub fn next_u32(&mut self) -> Result<u32> {
        Ok(self.generator()?.random::<u32>())
    }

    /// Draws a raw value reduced modulo `n` (uniform enough for index
    /// selection; keeps draw consumption at exactly one value).
    pub fn rand_index(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n > 0);
        Ok(self.next_u32()? % n)
    }

    /// Draws one float uniformly in `[lo, hi]`.
    pub fn uniform_f32(&mut self, lo: f32, hi: f32) -> Result<f32> {
        Ok(self.generator()?.random_range(lo..=hi))
    }

    /// Draws one integer uniformly in `[lo, hi]`.
    pub fn uniform_u32(&mut self, lo: u32, hi: u32) -> Result<u32> {
        Ok(self.generator()?.random_range(lo..=hi))
    }
}
