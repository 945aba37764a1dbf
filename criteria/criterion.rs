//! # Criterion Formula Variants
//!
//! A criterion defines how the latent regression inputs (B, D) and the
//! inverse vibration prediction are computed from an engine's physical
//! constants. Two variants are implemented as a tagged enum; adding a variant
//! means adding a tag and its two formula arms, nothing more.
//!
//! Both variants share one shape. B combines the excitation term, the group's
//! angular speed and the cylinder geometry, with the band's measured level in
//! the denominator; D is a stiffness ratio, constant across bands for a given
//! engine. The prediction formula is the algebraic inversion of those
//! definitions through the fitted line `D = a*B + b`, solved for the level.
//!
//! - `Second`: gas-pressure excitation, `B = S_n^2*w*D_c^2*p_z / (f*D_czb)`,
//!   `D = D_czvt/D_czb`, `V = a*w*S_n^2*D_c^2*p_z / (D_czvt - b*D_czb)`.
//! - `First`: piston side-force excitation across the liner clearance,
//!   `B = -N_max*delta*w*D_c^2 / (f*D_czb)`, `D = -D_czvt/D_czb`,
//!   `V = a*w*N_max*delta*D_c^2 / (D_czvt + b*D_czb)`.

use crate::data::{EngineParameters, FrequencyBand, ReferenceEngine};
use crate::groups::assign_group;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The available formula variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    First,
    Second,
}

/// Errors raised while evaluating criterion formulas.
#[derive(Error, Debug)]
pub enum CriterionError {
    #[error("cannot evaluate a criterion over an empty engine batch")]
    EmptyBatch,

    #[error(
        "latent pair for engine '{engine}' at band {band} Hz is not finite; check the measured level and stiffness values for zeros"
    )]
    NonFiniteLatent {
        engine: String,
        band: FrequencyBand,
    },

    #[error("engine '{engine}' has a shaft speed outside every group range")]
    UngroupedEngine { engine: String },

    #[error("engines from more than one shaft-speed group were passed in a single batch")]
    MixedGroups,

    #[error(
        "predicted vibration for engine '{engine}' is not finite; the stiffness denominator vanished for the fitted coefficients"
    )]
    NonFinitePrediction { engine: String },
}

impl Criterion {
    /// Display names of the regression coefficients for this variant, used in
    /// the exported regression table.
    pub fn coefficient_names(&self) -> (&'static str, &'static str) {
        match self {
            Criterion::First => ("C_1", "c"),
            Criterion::Second => ("C_2", "k"),
        }
    }

    /// Computes the latent vectors (B, D) for one group of reference engines
    /// at one band. `omega` is the group's shared angular speed.
    ///
    /// D is band-independent in both implemented variants; the band parameter
    /// stays in the signature so a future variant may vary D per band.
    pub fn latent_pair(
        &self,
        engines: &[&ReferenceEngine],
        omega: f64,
        band: FrequencyBand,
    ) -> Result<(Array1<f64>, Array1<f64>), CriterionError> {
        if engines.is_empty() {
            return Err(CriterionError::EmptyBatch);
        }

        let mut b = Array1::zeros(engines.len());
        let mut d = Array1::zeros(engines.len());
        for (row, engine) in engines.iter().enumerate() {
            let p = &engine.params;
            let level = engine.levels.level(band);
            let (b_value, d_value) = match self {
                Criterion::First => (
                    -p.N_max * p.delta * omega * p.D_c.powi(2) / (level * p.D_czb),
                    -p.D_czvt / p.D_czb,
                ),
                Criterion::Second => (
                    p.S_n.powi(2) * omega * p.D_c.powi(2) * p.p_z / (level * p.D_czb),
                    p.D_czvt / p.D_czb,
                ),
            };
            if !b_value.is_finite() || !d_value.is_finite() {
                return Err(CriterionError::NonFiniteLatent {
                    engine: p.name.clone(),
                    band,
                });
            }
            b[row] = b_value;
            d[row] = d_value;
        }
        Ok((b, d))
    }

    /// Evaluates the inverse vibration formula for a batch of engines using
    /// fitted coefficients `(a, b)` and the batch's shared angular speed.
    ///
    /// Every engine in the batch must belong to one shaft-speed group; the
    /// coefficients were fitted per group, so a mixed batch is a caller
    /// contract violation.
    pub fn predict_vibration(
        &self,
        engines: &[&EngineParameters],
        omega: f64,
        a: f64,
        b: f64,
    ) -> Result<Array1<f64>, CriterionError> {
        if engines.is_empty() {
            return Err(CriterionError::EmptyBatch);
        }
        validate_single_group(engines)?;

        let mut vibrations = Array1::zeros(engines.len());
        for (row, p) in engines.iter().enumerate() {
            let value = match self {
                Criterion::First => {
                    a * omega * p.N_max * p.delta * p.D_c.powi(2) / (p.D_czvt + b * p.D_czb)
                }
                Criterion::Second => {
                    a * omega * p.S_n.powi(2) * p.D_c.powi(2) * p.p_z / (p.D_czvt - b * p.D_czb)
                }
            };
            if !value.is_finite() {
                return Err(CriterionError::NonFinitePrediction {
                    engine: p.name.clone(),
                });
            }
            vibrations[row] = value;
        }
        Ok(vibrations)
    }
}

fn validate_single_group(engines: &[&EngineParameters]) -> Result<(), CriterionError> {
    let mut batch_group = None;
    for p in engines {
        let group = assign_group(p.nu).ok_or_else(|| CriterionError::UngroupedEngine {
            engine: p.name.clone(),
        })?;
        match batch_group {
            None => batch_group = Some(group),
            Some(expected) if expected != group => return Err(CriterionError::MixedGroups),
            Some(_) => {}
        }
    }
    Ok(())
}
