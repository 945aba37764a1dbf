//! # Calibrated Model Artifact
//!
//! The self-contained result of a calibration run: the criterion selection
//! and, per fitted shaft-speed group, the group's angular speed, member count
//! and per-band regression coefficients. Everything prediction needs lives
//! here, so a saved artifact can serve predictions without re-reading the
//! reference table.
//!
//! The artifact serializes to human-readable TOML; coefficients are stored as
//! explicit band records because TOML maps require string keys.

use crate::criterion::{Criterion, CriterionError};
use crate::data::{EngineParameters, FrequencyBand};
use crate::groups::{Group, assign_group};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use thiserror::Error;

/// User-facing calibration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Which formula variant the calibration used.
    pub criterion: Criterion,
    /// Reference level in dB the measured spectra are expressed against.
    /// Recorded for traceability; the formulas operate on the levels as given.
    pub base_level_db: f64,
}

/// The fitted line for one band of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandCoefficients {
    pub band: FrequencyBand,
    pub a: f64,
    pub b: f64,
}

/// Calibration state of one shaft-speed group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFit {
    pub group: Group,
    /// Angular speed derived from the reference table's group members at fit
    /// time. Predictions always use this value, never one derived from the
    /// candidate.
    pub omega: f64,
    /// Number of reference engines the group's regressions were fitted on.
    pub engines: usize,
    /// One record per band, in canonical band order.
    pub coefficients: Vec<BandCoefficients>,
}

/// The top-level, self-contained calibration artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedModel {
    pub config: CalibrationConfig,
    /// Fitted groups in ascending group order.
    pub groups: Vec<GroupFit>,
}

/// Errors for model persistence.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Errors raised while predicting a candidate's vibration spectrum.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(
        "candidate engine '{name}' has shaft speed {shaft_speed} rpm outside every group range"
    )]
    UngroupedCandidate { name: String, shaft_speed: f64 },

    #[error(
        "no calibration is stored for group {group}; the reference table had no fitted engines in that group"
    )]
    MissingCalibration { group: Group },

    #[error("the stored calibration for group {group} has no coefficients for band {band} Hz")]
    MissingBandCalibration { group: Group, band: FrequencyBand },

    #[error(transparent)]
    Criterion(#[from] CriterionError),
}

impl CalibratedModel {
    /// The fitted state of a group, if that group was present in the
    /// reference table.
    pub fn group_fit(&self, group: Group) -> Option<&GroupFit> {
        self.groups.iter().find(|fit| fit.group == group)
    }

    /// Predicts the candidate's vibration level at every band.
    ///
    /// The candidate is assigned to its shaft-speed group, the group's stored
    /// omega and per-band coefficients are looked up, and the criterion's
    /// inverse formula is evaluated on the single-candidate batch.
    pub fn predict(
        &self,
        candidate: &EngineParameters,
    ) -> Result<BTreeMap<FrequencyBand, f64>, PredictError> {
        let group = assign_group(candidate.nu).ok_or_else(|| PredictError::UngroupedCandidate {
            name: candidate.name.clone(),
            shaft_speed: candidate.nu,
        })?;
        let fit = self
            .group_fit(group)
            .ok_or(PredictError::MissingCalibration { group })?;

        let mut spectrum = BTreeMap::new();
        for band in FrequencyBand::ALL {
            let coefficients = fit
                .coefficients
                .iter()
                .find(|c| c.band == band)
                .ok_or(PredictError::MissingBandCalibration { group, band })?;
            let vibration = self.config.criterion.predict_vibration(
                &[candidate],
                fit.omega,
                coefficients.a,
                coefficients.b,
            )?;
            spectrum.insert(band, vibration[0]);
        }
        Ok(spectrum)
    }

    /// Saves the artifact to a file in human-readable TOML.
    pub fn save(&self, path: &str) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    /// Loads an artifact from a TOML file.
    pub fn load(path: &str) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let model = toml::from_str(&toml_string)?;
        Ok(model)
    }
}
