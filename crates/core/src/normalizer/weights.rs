//! Weight normalizer and its policies

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::bands::{BandTable, WeightBand};
use super::{RANDOMIZED_PRECISION, UNKNOWN_WEIGHT};
use crate::domain::interaction::InteractionKind;

/// How a band is turned into a single weight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// `(low + high) / 2`, deterministic
    #[default]
    Midpoint,
    /// Uniform draw from `[low, high]`, rounded to two decimals
    Randomized,
}

impl NormalizationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Midpoint => "midpoint",
            Self::Randomized => "randomized",
        }
    }
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "midpoint" => Ok(Self::Midpoint),
            "randomized" | "random" => Ok(Self::Randomized),
            other => Err(format!(
                "unsupported normalization policy `{other}` (expected midpoint|randomized)"
            )),
        }
    }
}

/// Normalizes interaction kinds into edge weights.
///
/// Under [`NormalizationPolicy::Randomized`] every call consumes the
/// generator, so callers needing a stable per-edge weight must sample once
/// and keep the value. A seeded normalizer restarts its stream on
/// [`WeightNormalizer::begin_pass`].
#[derive(Debug, Clone)]
pub struct WeightNormalizer {
    bands: BandTable,
    policy: NormalizationPolicy,
    seed: Option<u64>,
    rng: StdRng,
}

impl WeightNormalizer {
    /// Midpoint normalizer over the given bands
    pub fn new(bands: BandTable) -> Self {
        Self::with_policy(bands, NormalizationPolicy::Midpoint, None)
    }

    /// Randomized normalizer; without a seed the generator draws from OS entropy.
    pub fn randomized(bands: BandTable, seed: Option<u64>) -> Self {
        Self::with_policy(bands, NormalizationPolicy::Randomized, seed)
    }

    pub fn with_policy(bands: BandTable, policy: NormalizationPolicy, seed: Option<u64>) -> Self {
        Self { bands, policy, seed, rng: seeded_rng(seed) }
    }

    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    pub fn band_for(&self, kind: InteractionKind) -> Option<WeightBand> {
        self.bands.get(kind)
    }

    /// Mark the start of a full weighting pass (one graph build).
    pub fn begin_pass(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }

    pub fn weight_for(&mut self, kind: InteractionKind) -> f64 {
        let Some(band) = self.bands.get(kind) else {
            return UNKNOWN_WEIGHT;
        };

        match self.policy {
            NormalizationPolicy::Midpoint => band.midpoint(),
            NormalizationPolicy::Randomized => {
                // Off-grid bounds can round outside the band.
                let drawn = self.rng.gen_range(band.low()..=band.high());
                round_to_precision(drawn, RANDOMIZED_PRECISION).clamp(band.low(), band.high())
            }
        }
    }

    /// Lenient lookup from a raw label; unrecognised labels weigh zero.
    pub fn weight_for_label(&mut self, label: &str) -> f64 {
        match label.parse::<InteractionKind>() {
            Ok(kind) => self.weight_for(kind),
            Err(_) => UNKNOWN_WEIGHT,
        }
    }
}

impl Default for WeightNormalizer {
    fn default() -> Self {
        Self::new(BandTable::default())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn round_to_precision(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
