//! # Calibration Orchestration
//!
//! Drives the full calibration pass over a reference table: group the engines
//! by shaft-speed class, derive each group's angular speed, and for every
//! (group, band) cell compute the latent pair, fit the regression line and
//! evaluate the group's own fitted vibration vector. Groups are visited in
//! ascending id order and bands in canonical order; there is no cross-group
//! or cross-band dependency, the fixed order only makes output deterministic.
//!
//! Calibration either fully succeeds or fails with the (group, band) context
//! of the first offending cell; no partial artifact is returned.

use crate::criterion::CriterionError;
use crate::data::{EngineParameters, FrequencyBand, ReferenceEngine, ReferenceTable};
use crate::groups::{Group, assign_group, derive_omega};
use crate::model::{BandCoefficients, CalibratedModel, CalibrationConfig, GroupFit};
use crate::regression::{self, RegressionError};
use crate::results::{CalculationResults, Coefficients, LatentPair};
use std::collections::BTreeMap;
use thiserror::Error;

/// A comprehensive error type for the calibration pass.
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error(
        "reference engine '{name}' has shaft speed {shaft_speed} rpm outside every group range; fix or drop the row before calibrating"
    )]
    UngroupedEngine { name: String, shaft_speed: f64 },

    #[error("latent-pair computation failed for group {group}, band {band} Hz: {source}")]
    Latent {
        group: Group,
        band: FrequencyBand,
        #[source]
        source: CriterionError,
    },

    #[error("regression fit failed for group {group}, band {band} Hz: {source}")]
    Regression {
        group: Group,
        band: FrequencyBand,
        #[source]
        source: RegressionError,
    },

    #[error("fitted-vibration computation failed for group {group}, band {band} Hz: {source}")]
    FittedVibration {
        group: Group,
        band: FrequencyBand,
        #[source]
        source: CriterionError,
    },
}

/// The complete outcome of one calibration run: the persistable model plus
/// the intermediate values for export. Owned by the caller; independent
/// calibrations never share state.
#[derive(Debug)]
pub struct Calibration {
    pub model: CalibratedModel,
    pub results: CalculationResults,
}

/// Fits every group present in the reference table across all bands.
pub fn calibrate(
    table: &ReferenceTable,
    config: &CalibrationConfig,
) -> Result<Calibration, CalibrationError> {
    let members = group_members(table)?;
    let criterion = config.criterion;

    let mut results = CalculationResults::new();
    let mut fits = Vec::with_capacity(members.len());

    for (group, engines) in &members {
        let speeds: Vec<f64> = engines.iter().map(|e| e.params.nu).collect();
        let omega = derive_omega(&speeds);
        let params: Vec<&EngineParameters> = engines.iter().map(|e| &e.params).collect();

        let mut coefficients = Vec::with_capacity(FrequencyBand::ALL.len());
        for band in FrequencyBand::ALL {
            let (b, d) = criterion
                .latent_pair(engines, omega, band)
                .map_err(|source| CalibrationError::Latent {
                    group: *group,
                    band,
                    source,
                })?;
            let (slope, intercept) =
                regression::fit(b.view(), d.view()).map_err(|source| {
                    CalibrationError::Regression {
                        group: *group,
                        band,
                        source,
                    }
                })?;
            let fitted = criterion
                .predict_vibration(&params, omega, slope, intercept)
                .map_err(|source| CalibrationError::FittedVibration {
                    group: *group,
                    band,
                    source,
                })?;

            for (row, engine) in engines.iter().enumerate() {
                results.record_latent(
                    &engine.params.name,
                    band,
                    LatentPair {
                        b: b[row],
                        d: d[row],
                    },
                );
                results.record_vibration(&engine.params.name, band, fitted[row]);
            }
            results.record_coefficients(
                *group,
                band,
                Coefficients {
                    a: slope,
                    b: intercept,
                },
            );
            coefficients.push(BandCoefficients {
                band,
                a: slope,
                b: intercept,
            });
        }

        fits.push(GroupFit {
            group: *group,
            omega,
            engines: engines.len(),
            coefficients,
        });
    }

    Ok(Calibration {
        model: CalibratedModel {
            config: config.clone(),
            groups: fits,
        },
        results,
    })
}

/// Partitions the table by shaft-speed class, ascending. An engine outside
/// every range is a data-quality failure, not a row to skip silently.
fn group_members(
    table: &ReferenceTable,
) -> Result<BTreeMap<Group, Vec<&ReferenceEngine>>, CalibrationError> {
    let mut members: BTreeMap<Group, Vec<&ReferenceEngine>> = BTreeMap::new();
    for engine in table.engines() {
        let group =
            assign_group(engine.params.nu).ok_or_else(|| CalibrationError::UngroupedEngine {
                name: engine.params.name.clone(),
                shaft_speed: engine.params.nu,
            })?;
        members.entry(group).or_default().push(engine);
    }
    Ok(members)
}
