//! Interaction weight normalization
//!
//! Maps an interaction kind to a numeric edge weight using a fixed per-kind
//! band and an explicit policy (band midpoint, or a seeded draw from the band).

mod bands;
mod weights;

pub use bands::{BandTable, WeightBand};
pub use weights::{NormalizationPolicy, WeightNormalizer};

/// Decimal digits kept on randomized weights.
pub const RANDOMIZED_PRECISION: i32 = 2;

/// Weight contributed by an interaction the normalizer does not recognise.
pub const UNKNOWN_WEIGHT: f64 = 0.0;
