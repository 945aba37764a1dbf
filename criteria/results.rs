//! # Calculation Result Store
//!
//! Intermediate and final values produced by one calibration, held in two
//! explicit composite-key maps rather than a generic hierarchical table:
//! latent pairs and fitted vibrations are keyed by `(engine, band)`,
//! regression coefficients by `(group, band)`. `BTreeMap` keys give stable
//! iteration order, which makes export ordering deterministic.
//!
//! Cells are write-once: each `(group, band)` iteration of the calibration
//! fills its cells exactly once and nothing is ever cleared.

use crate::data::FrequencyBand;
use crate::groups::Group;
use std::collections::BTreeMap;

/// The per-engine, per-band latent regression inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatentPair {
    pub b: f64,
    pub d: f64,
}

/// The fitted line `D = a*B + b` for one (group, band) cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
}

/// All values produced by one calibration run. Owned by exactly one
/// calibration; exported read-only afterwards.
#[derive(Debug, Default)]
pub struct CalculationResults {
    latent: BTreeMap<(String, FrequencyBand), LatentPair>,
    coefficients: BTreeMap<(Group, FrequencyBand), Coefficients>,
    vibrations: BTreeMap<(String, FrequencyBand), f64>,
}

impl CalculationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_latent(&mut self, engine: &str, band: FrequencyBand, pair: LatentPair) {
        let previous = self.latent.insert((engine.to_string(), band), pair);
        debug_assert!(previous.is_none(), "latent cell written twice");
    }

    pub fn record_coefficients(
        &mut self,
        group: Group,
        band: FrequencyBand,
        coefficients: Coefficients,
    ) {
        let previous = self.coefficients.insert((group, band), coefficients);
        debug_assert!(previous.is_none(), "coefficient cell written twice");
    }

    pub fn record_vibration(&mut self, engine: &str, band: FrequencyBand, level: f64) {
        let previous = self.vibrations.insert((engine.to_string(), band), level);
        debug_assert!(previous.is_none(), "vibration cell written twice");
    }

    pub fn latent(&self, engine: &str, band: FrequencyBand) -> Option<LatentPair> {
        self.latent.get(&(engine.to_string(), band)).copied()
    }

    pub fn coefficients(&self, group: Group, band: FrequencyBand) -> Option<Coefficients> {
        self.coefficients.get(&(group, band)).copied()
    }

    pub fn vibration(&self, engine: &str, band: FrequencyBand) -> Option<f64> {
        self.vibrations.get(&(engine.to_string(), band)).copied()
    }

    /// Groups that have at least one fitted coefficient cell, ascending.
    pub fn fitted_groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.coefficients.keys().map(|(group, _)| *group).collect();
        groups.dedup();
        groups
    }
}
