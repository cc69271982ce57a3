//! Weight bands per interaction kind

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::interaction::InteractionKind;
use crate::errors::DomainError;

/// Closed `[low, high]` range within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct WeightBand {
    low: f64,
    high: f64,
}

impl WeightBand {
    pub fn new(low: f64, high: f64) -> Result<Self, DomainError> {
        Self::for_kind("band", low, high)
    }

    /// Same as [`WeightBand::new`] but names the kind in the error.
    pub fn for_kind(kind: &str, low: f64, high: f64) -> Result<Self, DomainError> {
        let in_range = |value: f64| (0.0..=1.0).contains(&value);
        if !in_range(low) || !in_range(high) || low > high {
            return Err(DomainError::InvalidWeightBand { kind: kind.to_owned(), low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl TryFrom<(f64, f64)> for WeightBand {
    type Error = DomainError;

    fn try_from((low, high): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(low, high)
    }
}

impl From<WeightBand> for (f64, f64) {
    fn from(band: WeightBand) -> Self {
        (band.low, band.high)
    }
}

// Literal bands below are known-valid, so they skip validation.
const fn band(low: f64, high: f64) -> WeightBand {
    WeightBand { low, high }
}

const DEFAULT_BANDS: [(InteractionKind, WeightBand); 5] = [
    (InteractionKind::Purchase, band(0.95, 1.0)),
    (InteractionKind::Cart, band(0.70, 0.85)),
    (InteractionKind::Like, band(0.50, 0.65)),
    (InteractionKind::View, band(0.30, 0.45)),
    (InteractionKind::Skip, band(0.0, 0.15)),
];

/// Kind to band lookup handed to the normalizer at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    bands: BTreeMap<InteractionKind, WeightBand>,
}

impl BandTable {
    /// Table with no bands; every kind weighs zero until one is inserted.
    pub fn empty() -> Self {
        Self { bands: BTreeMap::new() }
    }

    pub fn with_band(mut self, kind: InteractionKind, band: WeightBand) -> Self {
        self.insert(kind, band);
        self
    }

    pub fn insert(&mut self, kind: InteractionKind, band: WeightBand) -> Option<WeightBand> {
        self.bands.insert(kind, band)
    }

    pub fn get(&self, kind: InteractionKind) -> Option<WeightBand> {
        self.bands.get(&kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InteractionKind, WeightBand)> + '_ {
        self.bands.iter().map(|(kind, band)| (*kind, *band))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self { bands: DEFAULT_BANDS.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::{BandTable, WeightBand};
    use crate::domain::interaction::InteractionKind;
    use crate::errors::DomainError;

    #[test]
    fn default_table_covers_every_kind() {
        let table = BandTable::default();

        assert_eq!(table.len(), InteractionKind::ALL.len());
        for kind in InteractionKind::ALL {
            let band = table.get(kind).expect("band for kind");
            assert!(band.low() <= band.high());
        }
    }

    #[test]
    fn default_purchase_band_matches_catalog() {
        let band = BandTable::default().get(InteractionKind::Purchase).expect("purchase band");

        assert_eq!(band.low(), 0.95);
        assert_eq!(band.high(), 1.0);
        assert!((band.midpoint() - 0.975).abs() < 1e-12);
    }

    #[test]
    fn rejects_inverted_and_out_of_range_bands() {
        assert!(matches!(WeightBand::new(0.6, 0.4), Err(DomainError::InvalidWeightBand { .. })));
        assert!(matches!(WeightBand::new(-0.1, 0.4), Err(DomainError::InvalidWeightBand { .. })));
        assert!(matches!(WeightBand::new(0.2, 1.2), Err(DomainError::InvalidWeightBand { .. })));
        assert!(WeightBand::new(0.3, 0.3).is_ok());
    }

    #[test]
    fn for_kind_names_the_kind() {
        let error = WeightBand::for_kind("like", 0.9, 0.1).expect_err("inverted band");
        assert_eq!(
            error,
            DomainError::InvalidWeightBand { kind: "like".to_owned(), low: 0.9, high: 0.1 }
        );
    }

    #[test]
    fn custom_table_overrides_a_single_band() {
        let band = WeightBand::new(0.1, 0.2).expect("valid band");
        let table = BandTable::empty().with_band(InteractionKind::Like, band);

        assert_eq!(table.get(InteractionKind::Like), Some(band));
        assert_eq!(table.get(InteractionKind::Purchase), None);
    }

    #[test]
    fn band_deserializes_from_pair_and_validates() {
        let band: WeightBand = serde_json::from_str("[0.3, 0.45]").expect("valid pair");
        assert_eq!(band.high(), 0.45);

        let inverted = serde_json::from_str::<WeightBand>("[0.45, 0.3]");
        assert!(inverted.is_err());
    }
}
