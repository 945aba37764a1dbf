//! # Tabular Export of Calculation Results
//!
//! Writes the three result tables of a calibration run as CSV files:
//!
//! - `B_D.csv` — per engine, per band latent values (`B_63`, `D_63`, ...);
//! - `regression.csv` — one row per (group, coefficient name), one column per
//!   band, coefficient names following the criterion variant;
//! - `vibrations.csv` — per engine, per band fitted vibration levels.
//!
//! Engines appear in reference-table order and groups ascending, so repeated
//! exports of the same calibration are byte-identical.

use crate::criterion::Criterion;
use crate::data::{FrequencyBand, ReferenceTable};
use crate::results::CalculationResults;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors for result-table export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Writes `B_D.csv`, `regression.csv` and `vibrations.csv` into `dir`,
/// creating the directory if needed.
pub fn export_results(
    dir: &str,
    table: &ReferenceTable,
    criterion: Criterion,
    results: &CalculationResults,
) -> Result<(), ExportError> {
    fs::create_dir_all(dir)?;
    write_csv(dir, "B_D.csv", latent_frame(table, results)?)?;
    write_csv(dir, "regression.csv", regression_frame(criterion, results)?)?;
    write_csv(dir, "vibrations.csv", vibration_frame(table, results)?)?;
    Ok(())
}

fn write_csv(dir: &str, file_name: &str, mut df: DataFrame) -> Result<(), ExportError> {
    let mut file = fs::File::create(Path::new(dir).join(file_name))?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}

fn engine_names(table: &ReferenceTable) -> Vec<String> {
    table
        .engines()
        .iter()
        .map(|engine| engine.params.name.clone())
        .collect()
}

fn latent_frame(
    table: &ReferenceTable,
    results: &CalculationResults,
) -> Result<DataFrame, ExportError> {
    let names = engine_names(table);
    let mut columns = vec![Series::new("name".into(), &names).into()];
    for band in FrequencyBand::ALL {
        let b: Vec<Option<f64>> = names
            .iter()
            .map(|name| results.latent(name, band).map(|pair| pair.b))
            .collect();
        let d: Vec<Option<f64>> = names
            .iter()
            .map(|name| results.latent(name, band).map(|pair| pair.d))
            .collect();
        columns.push(Series::new(format!("B_{}", band.label()).into(), b).into());
        columns.push(Series::new(format!("D_{}", band.label()).into(), d).into());
    }
    Ok(DataFrame::new(columns)?)
}

fn regression_frame(
    criterion: Criterion,
    results: &CalculationResults,
) -> Result<DataFrame, ExportError> {
    let groups = results.fitted_groups();
    let (slope_name, intercept_name) = criterion.coefficient_names();

    let mut group_column = Vec::with_capacity(groups.len() * 2);
    let mut coefficient_column = Vec::with_capacity(groups.len() * 2);
    for group in &groups {
        group_column.push(format!("Group {group}"));
        coefficient_column.push(slope_name.to_string());
        group_column.push(format!("Group {group}"));
        coefficient_column.push(intercept_name.to_string());
    }

    let mut columns = vec![
        Series::new("group".into(), &group_column).into(),
        Series::new("coefficient".into(), &coefficient_column).into(),
    ];
    for band in FrequencyBand::ALL {
        let mut values: Vec<Option<f64>> = Vec::with_capacity(groups.len() * 2);
        for group in &groups {
            let cell = results.coefficients(*group, band);
            values.push(cell.map(|c| c.a));
            values.push(cell.map(|c| c.b));
        }
        columns.push(Series::new(band.label().into(), values).into());
    }
    Ok(DataFrame::new(columns)?)
}

fn vibration_frame(
    table: &ReferenceTable,
    results: &CalculationResults,
) -> Result<DataFrame, ExportError> {
    let names = engine_names(table);
    let mut columns = vec![Series::new("name".into(), &names).into()];
    for band in FrequencyBand::ALL {
        let values: Vec<Option<f64>> = names
            .iter()
            .map(|name| results.vibration(name, band))
            .collect();
        columns.push(Series::new(band.label().into(), values).into());
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BandLevels, EngineParameters, ReferenceEngine};
    use crate::groups::Group;
    use crate::results::{Coefficients, LatentPair};

    fn table() -> ReferenceTable {
        let engine = |name: &str, nu: f64| ReferenceEngine {
            params: EngineParameters {
                name: name.to_string(),
                nu,
                N_e: 300.0,
                p_e: 0.5,
                p_z: 5.0,
                N_max: 16000.0,
                delta: 0.0002,
                D_czvt: 2000.0,
                D_czb: 10000.0,
                S_n: 0.3,
                D_c: 2.0,
            },
            levels: BandLevels::new([90.0; 8]),
        };
        ReferenceTable::from_engines(vec![engine("E1", 500.0), engine("E2", 600.0)]).unwrap()
    }

    fn results() -> CalculationResults {
        let mut results = CalculationResults::new();
        let group = Group::try_from(2).unwrap();
        for band in FrequencyBand::ALL {
            for (name, b) in [("E1", 1.0e-4), ("E2", 2.0e-4)] {
                results.record_latent(name, band, LatentPair { b, d: 0.25 });
                results.record_vibration(name, band, 90.0);
            }
            results.record_coefficients(group, band, Coefficients { a: 1000.0, b: 0.1 });
        }
        results
    }

    #[test]
    fn exports_all_three_tables_with_expected_headers() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        export_results(dir_path, &table(), Criterion::Second, &results()).unwrap();

        let latent = fs::read_to_string(dir.path().join("B_D.csv")).unwrap();
        let latent_header = latent.lines().next().unwrap();
        assert!(latent_header.starts_with("name,B_63,D_63,B_140,D_140"));
        assert!(latent_header.ends_with("B_8000,D_8000"));
        assert!(latent.contains("E1"));
        assert!(latent.contains("E2"));

        let regression = fs::read_to_string(dir.path().join("regression.csv")).unwrap();
        let regression_header = regression.lines().next().unwrap();
        assert_eq!(
            regression_header,
            "group,coefficient,63,140,250,500,1000,2000,4000,8000"
        );
        assert!(regression.contains("Group 2,C_2"));
        assert!(regression.contains("Group 2,k"));
        assert_eq!(regression.lines().count(), 3);

        let vibrations = fs::read_to_string(dir.path().join("vibrations.csv")).unwrap();
        assert_eq!(
            vibrations.lines().next().unwrap(),
            "name,63,140,250,500,1000,2000,4000,8000"
        );
        assert_eq!(vibrations.lines().count(), 3);
    }

    #[test]
    fn repeated_export_is_byte_identical() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let table = table();
        let results = results();
        export_results(dir_a.path().to_str().unwrap(), &table, Criterion::Second, &results)
            .unwrap();
        export_results(dir_b.path().to_str().unwrap(), &table, Criterion::Second, &results)
            .unwrap();
        for file in ["B_D.csv", "regression.csv", "vibrations.csv"] {
            let a = fs::read_to_string(dir_a.path().join(file)).unwrap();
            let b = fs::read_to_string(dir_b.path().join(file)).unwrap();
            assert_eq!(a, b, "{file} differs between exports");
        }
    }
}
