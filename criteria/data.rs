//! # Data Loading and Validation Module
//!
//! This module is the exclusive entry point for user-provided engine data.
//! It reads the reference table (CSV) and candidate engine files (TOML),
//! validates them against a strict schema, and produces the clean structures
//! the calibration core operates on.
//!
//! - Strict schema: column names are not configurable. Physical constants use
//!   the domain's symbol names (`nu`, `p_z`, `D_czb`, ...) and measured
//!   spectra use `f63`..`f8000`. Extra columns (a legacy `ID` or `group`
//!   column) are tolerated and ignored; group membership is always re-derived
//!   from shaft speed.
//! - User-centric errors: failures are assumed to be user-input errors and
//!   `DataError` messages say which column and what to fix.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// The eight standard octave bands, in canonical display order.
///
/// Computation is per-band independent; the order only fixes iteration and
/// export layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FrequencyBand {
    #[serde(rename = "63")]
    Hz63,
    #[serde(rename = "140")]
    Hz140,
    #[serde(rename = "250")]
    Hz250,
    #[serde(rename = "500")]
    Hz500,
    #[serde(rename = "1000")]
    Hz1000,
    #[serde(rename = "2000")]
    Hz2000,
    #[serde(rename = "4000")]
    Hz4000,
    #[serde(rename = "8000")]
    Hz8000,
}

impl FrequencyBand {
    /// All bands in canonical order.
    pub const ALL: [FrequencyBand; 8] = [
        FrequencyBand::Hz63,
        FrequencyBand::Hz140,
        FrequencyBand::Hz250,
        FrequencyBand::Hz500,
        FrequencyBand::Hz1000,
        FrequencyBand::Hz2000,
        FrequencyBand::Hz4000,
        FrequencyBand::Hz8000,
    ];

    /// Position of the band in [`FrequencyBand::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The band's centre frequency as a display label, e.g. `"500"`.
    pub fn label(self) -> &'static str {
        match self {
            FrequencyBand::Hz63 => "63",
            FrequencyBand::Hz140 => "140",
            FrequencyBand::Hz250 => "250",
            FrequencyBand::Hz500 => "500",
            FrequencyBand::Hz1000 => "1000",
            FrequencyBand::Hz2000 => "2000",
            FrequencyBand::Hz4000 => "4000",
            FrequencyBand::Hz8000 => "8000",
        }
    }

    /// The reference-table column holding the measured level for this band.
    pub fn level_column(self) -> &'static str {
        match self {
            FrequencyBand::Hz63 => "f63",
            FrequencyBand::Hz140 => "f140",
            FrequencyBand::Hz250 => "f250",
            FrequencyBand::Hz500 => "f500",
            FrequencyBand::Hz1000 => "f1000",
            FrequencyBand::Hz2000 => "f2000",
            FrequencyBand::Hz4000 => "f4000",
            FrequencyBand::Hz8000 => "f8000",
        }
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The physical record of one engine.
///
/// Pure input data: neither the shaft-speed group nor omega is stored here —
/// both are derived on demand, so the same record can safely feed several
/// independent calibrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    /// Engine designation; the unique key of the reference table.
    pub name: String,
    /// Shaft speed, rpm.
    pub nu: f64,
    /// Effective power.
    pub N_e: f64,
    /// Mean effective cycle pressure.
    pub p_e: f64,
    /// Peak cycle pressure.
    pub p_z: f64,
    /// Maximum piston side force.
    pub N_max: f64,
    /// Piston-to-liner clearance.
    pub delta: f64,
    /// Cylinder-liner stiffness.
    pub D_czvt: f64,
    /// Cylinder-block stiffness.
    pub D_czb: f64,
    /// Piston stroke.
    pub S_n: f64,
    /// Cylinder diameter.
    pub D_c: f64,
}

/// Measured vibration levels of a reference engine, one per band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels([f64; FrequencyBand::ALL.len()]);

impl BandLevels {
    /// Levels in canonical band order.
    pub fn new(levels: [f64; FrequencyBand::ALL.len()]) -> Self {
        BandLevels(levels)
    }

    pub fn level(&self, band: FrequencyBand) -> f64 {
        self.0[band.index()]
    }
}

/// One row of the reference table: physical constants plus measured spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEngine {
    pub params: EngineParameters,
    pub levels: BandLevels,
}

/// The calibration reference table: an ordered collection of engines with
/// unique names, loaded once and treated as read-only afterwards.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    engines: Vec<ReferenceEngine>,
}

impl ReferenceTable {
    /// Wraps already-parsed rows, enforcing name uniqueness and the minimum
    /// row count.
    pub fn from_engines(engines: Vec<ReferenceEngine>) -> Result<Self, DataError> {
        if engines.len() < internal::MINIMUM_ROWS {
            return Err(DataError::InsufficientRows {
                found: engines.len(),
                required: internal::MINIMUM_ROWS,
            });
        }
        let mut seen = HashSet::new();
        for engine in &engines {
            if !seen.insert(engine.params.name.as_str()) {
                return Err(DataError::DuplicateEngineName(engine.params.name.clone()));
            }
        }
        Ok(ReferenceTable { engines })
    }

    /// Loads and validates a reference table from a CSV file.
    pub fn load(path: &str) -> Result<Self, DataError> {
        let engines = internal::load_reference_rows(path)?;
        ReferenceTable::from_engines(engines)
    }

    pub fn engines(&self) -> &[ReferenceEngine] {
        &self.engines
    }
}

/// Loads a candidate engine from a TOML file. Candidates carry only the
/// physical record — their vibration spectrum is what gets predicted.
pub fn load_candidate(path: &str) -> Result<EngineParameters, DataError> {
    let text = std::fs::read_to_string(path)?;
    let candidate = toml::from_str(&text)?;
    Ok(candidate)
}

/// A comprehensive error type for all data loading and validation failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse candidate engine TOML: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error(
        "The required column '{column_name}' could not be converted to the expected type '{expected_type}'. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error(
        "Missing or null values were found in the required column '{0}'. The reference table requires complete data."
    )]
    MissingValuesFound(String),
    #[error(
        "Non-finite values (NaN or Infinity) were found in the required column '{0}'. All reference data must be finite."
    )]
    NonFiniteValuesFound(String),
    #[error(
        "The reference table contains only {found} data rows, but at least {required} are needed to fit a regression."
    )]
    InsufficientRows { found: usize, required: usize },
    #[error(
        "The engine name '{0}' appears more than once in the reference table; names are the unique row key."
    )]
    DuplicateEngineName(String),
}

/// Internal module for the polars-backed CSV parsing.
mod internal {
    use super::*;

    pub(super) const MINIMUM_ROWS: usize = 2;

    /// Physical-constant columns, in `EngineParameters` field order.
    const NUMERIC_COLUMNS: [&str; 10] = [
        "nu", "N_e", "p_e", "p_z", "N_max", "delta", "D_czvt", "D_czb", "S_n", "D_c",
    ];

    fn validate_is_finite(values: &[f64], column_name: &str) -> Result<(), DataError> {
        if values.iter().any(|&v| !v.is_finite()) {
            return Err(DataError::NonFiniteValuesFound(column_name.to_string()));
        }
        Ok(())
    }

    fn extract_numeric_column(df: &DataFrame, column_name: &str) -> Result<Vec<f64>, DataError> {
        let series = df.column(column_name)?;
        if series.null_count() > 0 {
            return Err(DataError::MissingValuesFound(column_name.to_string()));
        }

        let casted = match series.cast(&DataType::Float64) {
            Ok(casted) => casted,
            Err(_) => {
                return Err(DataError::ColumnWrongType {
                    column_name: column_name.to_string(),
                    expected_type: "f64 (numeric)",
                    found_type: format!("{:?}", series.dtype()),
                });
            }
        };

        if casted.null_count() > 0 {
            return Err(DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                expected_type: "f64 (numeric)",
                found_type: format!("{:?}", series.dtype()),
            });
        }

        let chunked = casted.f64()?.rechunk();
        let values: Vec<f64> = chunked.into_no_null_iter().collect();
        validate_is_finite(&values, column_name)?;
        Ok(values)
    }

    fn extract_names(df: &DataFrame) -> Result<Vec<String>, DataError> {
        let series = df.column("name")?;
        if series.null_count() > 0 {
            return Err(DataError::MissingValuesFound("name".to_string()));
        }
        let chunked = match series.str() {
            Ok(chunked) => chunked,
            Err(_) => {
                return Err(DataError::ColumnWrongType {
                    column_name: "name".to_string(),
                    expected_type: "string",
                    found_type: format!("{:?}", series.dtype()),
                });
            }
        };
        Ok(chunked
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect())
    }

    pub(super) fn load_reference_rows(path: &str) -> Result<Vec<ReferenceEngine>, DataError> {
        let df = CsvReader::new(File::open(Path::new(path))?)
            .with_options(CsvReadOptions::default().with_has_header(true))
            .finish()?;

        // Verify all required columns exist before touching any values.
        let columns_set: HashSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let mut required: Vec<&str> = vec!["name"];
        required.extend_from_slice(&NUMERIC_COLUMNS);
        required.extend(FrequencyBand::ALL.iter().map(|band| band.level_column()));
        for column in &required {
            if !columns_set.contains(*column) {
                return Err(DataError::ColumnNotFound((*column).to_string()));
            }
        }

        let names = extract_names(&df)?;

        let nu = extract_numeric_column(&df, "nu")?;
        let N_e = extract_numeric_column(&df, "N_e")?;
        let p_e = extract_numeric_column(&df, "p_e")?;
        let p_z = extract_numeric_column(&df, "p_z")?;
        let N_max = extract_numeric_column(&df, "N_max")?;
        let delta = extract_numeric_column(&df, "delta")?;
        let D_czvt = extract_numeric_column(&df, "D_czvt")?;
        let D_czb = extract_numeric_column(&df, "D_czb")?;
        let S_n = extract_numeric_column(&df, "S_n")?;
        let D_c = extract_numeric_column(&df, "D_c")?;

        let mut level_columns = Vec::with_capacity(FrequencyBand::ALL.len());
        for band in FrequencyBand::ALL {
            level_columns.push(extract_numeric_column(&df, band.level_column())?);
        }

        let mut engines = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let mut levels = [0.0; FrequencyBand::ALL.len()];
            for (slot, column) in levels.iter_mut().zip(&level_columns) {
                *slot = column[row];
            }
            engines.push(ReferenceEngine {
                params: EngineParameters {
                    name: names[row].clone(),
                    nu: nu[row],
                    N_e: N_e[row],
                    p_e: p_e[row],
                    p_z: p_z[row],
                    N_max: N_max[row],
                    delta: delta[row],
                    D_czvt: D_czvt[row],
                    D_czb: D_czb[row],
                    S_n: S_n[row],
                    D_c: D_c[row],
                },
                levels: BandLevels::new(levels),
            });
        }
        Ok(engines)
    }
}
