//! End-to-end pipeline tests: reference CSV -> calibration -> exported
//! tables and saved artifact -> candidate prediction.
//!
//! The fixture uses two-engine groups, which makes every per-band least
//! squares fit exactly determined: the fitted line passes through both (B, D)
//! points, so the group's fitted vibrations must reproduce its measured
//! levels, and the candidate prediction has a closed-form hand-computed
//! value.

use approx::assert_abs_diff_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use seism::criterion::Criterion;
use seism::data::{EngineParameters, FrequencyBand, ReferenceTable};
use seism::estimate::{Calibration, calibrate};
use seism::groups::Group;
use seism::model::{CalibratedModel, CalibrationConfig, PredictError};
use seism::storage::export_results;

const HEADER: &str =
    "name,nu,N_e,p_e,p_z,N_max,delta,D_czvt,D_czb,S_n,D_c,f63,f140,f250,f500,f1000,f2000,f4000,f8000";

/// Groups {2, 3}, two engines each, constant spectrum per engine.
fn reference_csv() -> String {
    let mut rows = vec![HEADER.to_string()];
    for (name, nu, p_z, n_max, d_czvt, s_n, level) in [
        ("E1", 500.0, 5.0, 16000.0, 2000.0, 0.3, 90.0),
        ("E2", 600.0, 5.0, 17000.0, 3000.0, 0.4, 80.0),
        ("E3", 800.0, 6.0, 18000.0, 2500.0, 0.3, 100.0),
        ("E4", 900.0, 6.0, 19000.0, 4000.0, 0.5, 120.0),
    ] {
        let levels = vec![format!("{level}"); 8].join(",");
        rows.push(format!(
            "{name},{nu},300,0.5,{p_z},{n_max},0.0002,{d_czvt},10000,{s_n},2,{levels}"
        ));
    }
    rows.join("\n")
}

fn load_fixture_table() -> (NamedTempFile, ReferenceTable) {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", reference_csv()).unwrap();
    file.flush().unwrap();
    let table = ReferenceTable::load(file.path().to_str().unwrap()).unwrap();
    (file, table)
}

fn run_calibration(criterion: Criterion) -> (NamedTempFile, ReferenceTable, Calibration) {
    let (file, table) = load_fixture_table();
    let config = CalibrationConfig {
        criterion,
        base_level_db: 86.0,
    };
    let calibration = calibrate(&table, &config).unwrap();
    (file, table, calibration)
}

fn candidate() -> EngineParameters {
    EngineParameters {
        name: "candidate".to_string(),
        nu: 520.0,
        N_e: 294.0,
        p_e: 0.54,
        p_z: 6.0,
        N_max: 16490.0,
        delta: 0.0002,
        D_czvt: 2500.0,
        D_czb: 12500.0,
        S_n: 0.5,
        D_c: 2.0,
    }
}

#[test]
fn csv_to_calibration_recovers_the_hand_derived_coefficients() {
    let (_file, _table, calibration) = run_calibration(Criterion::Second);
    let group_2 = Group::try_from(2).unwrap();

    // Group 2: B = {2e-6 w, 4e-6 w}, D = {0.2, 0.3}
    // => slope 5e4 / w, intercept 0.1 at every band.
    let omega = calibration.model.group_fit(group_2).unwrap().omega;
    assert_abs_diff_eq!(omega, 550.0 * std::f64::consts::PI / 30.0, epsilon = 1e-9);
    for band in FrequencyBand::ALL {
        let cell = calibration.results.coefficients(group_2, band).unwrap();
        assert_abs_diff_eq!(cell.a, 5.0e4 / omega, epsilon = 1e-6);
        assert_abs_diff_eq!(cell.b, 0.1, epsilon = 1e-9);
    }
}

#[test]
fn fitted_vibrations_reproduce_the_measured_levels() {
    for criterion in [Criterion::First, Criterion::Second] {
        let (_file, _table, calibration) = run_calibration(criterion);
        for (name, level) in [("E1", 90.0), ("E2", 80.0), ("E3", 100.0), ("E4", 120.0)] {
            for band in FrequencyBand::ALL {
                let fitted = calibration.results.vibration(name, band).unwrap();
                assert_abs_diff_eq!(fitted, level, epsilon = 1e-6);
            }
        }
    }
}

#[test]
fn saved_model_predicts_the_candidate_spectrum() {
    let (_file, _table, calibration) = run_calibration(Criterion::Second);

    let model_file = NamedTempFile::new().unwrap();
    let model_path = model_file.path().to_str().unwrap();
    calibration.model.save(model_path).unwrap();
    let model = CalibratedModel::load(model_path).unwrap();
    assert_eq!(model, calibration.model);

    // V = a*w*S_n^2*D_c^2*p_z / (D_czvt - b*D_czb)
    //   = (5e4/w)*w*6 / (2500 - 0.1*12500) = 3e5 / 1250 = 240, every band.
    let spectrum = model.predict(&candidate()).unwrap();
    assert_eq!(spectrum.len(), 8);
    for band in FrequencyBand::ALL {
        assert_abs_diff_eq!(spectrum[&band], 240.0, epsilon = 1e-6);
    }
}

#[test]
fn prediction_for_an_unfitted_group_is_a_lookup_error() {
    let (_file, _table, calibration) = run_calibration(Criterion::Second);

    // 2000 rpm -> group 4; the fixture table only covers groups 2 and 3.
    let mut stray = candidate();
    stray.nu = 2000.0;
    let err = calibration.model.predict(&stray).unwrap_err();
    match err {
        PredictError::MissingCalibration { group } => assert_eq!(group.id(), 4),
        other => panic!("expected MissingCalibration, got {other:?}"),
    }
}

#[test]
fn prediction_for_an_ungrouped_candidate_is_a_validation_error() {
    let (_file, _table, calibration) = run_calibration(Criterion::Second);
    let mut stray = candidate();
    stray.nu = 10000.0;
    assert!(matches!(
        calibration.model.predict(&stray).unwrap_err(),
        PredictError::UngroupedCandidate { .. }
    ));
}

#[test]
fn exported_tables_cover_every_engine_and_group() {
    let (_file, table, calibration) = run_calibration(Criterion::Second);

    let dir = TempDir::new().unwrap();
    export_results(
        dir.path().to_str().unwrap(),
        &table,
        Criterion::Second,
        &calibration.results,
    )
    .unwrap();

    let latent = std::fs::read_to_string(dir.path().join("B_D.csv")).unwrap();
    assert_eq!(latent.lines().count(), 5); // header + 4 engines
    for name in ["E1", "E2", "E3", "E4"] {
        assert!(latent.contains(name));
    }

    let regression = std::fs::read_to_string(dir.path().join("regression.csv")).unwrap();
    assert_eq!(regression.lines().count(), 5); // header + 2 rows per group
    assert!(regression.contains("Group 2,C_2"));
    assert!(regression.contains("Group 3,k"));

    let vibrations = std::fs::read_to_string(dir.path().join("vibrations.csv")).unwrap();
    assert_eq!(vibrations.lines().count(), 5);
    assert!(
        vibrations
            .lines()
            .next()
            .unwrap()
            .starts_with("name,63,140")
    );
}

#[test]
fn the_two_criteria_disagree_on_the_candidate() {
    // Same table, same candidate: the variants weight different physical
    // terms, so their predictions should generically differ.
    let (_file, _table, second) = run_calibration(Criterion::Second);
    let (_file_2, _table_2, first) = run_calibration(Criterion::First);
    let second_spectrum = second.model.predict(&candidate()).unwrap();
    let first_spectrum = first.model.predict(&candidate()).unwrap();
    let band = FrequencyBand::Hz500;
    assert!((second_spectrum[&band] - first_spectrum[&band]).abs() > 1e-6);
}
