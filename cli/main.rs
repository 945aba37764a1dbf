#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::process;

use seism::criterion::Criterion;
use seism::data::{self, ReferenceTable};
use seism::estimate::calibrate;
use seism::model::{CalibratedModel, CalibrationConfig};
use seism::storage::export_results;

mod theory;

#[derive(Clone, Copy, ValueEnum)]
enum CriterionArg {
    /// Piston side-force excitation
    First,
    /// Gas-pressure excitation
    Second,
}

impl From<CriterionArg> for Criterion {
    fn from(arg: CriterionArg) -> Criterion {
        match arg {
            CriterionArg::First => Criterion::First,
            CriterionArg::Second => Criterion::Second,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "seism",
    about = "Predict diesel engine vibration spectra from a calibrated reference table",
    long_about = "Calibrates a vibration criterion against a reference table of known engines \
                 (grouped by shaft speed) and predicts the eight-band vibration spectrum of \
                 new engines from their physical constants."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate a criterion against a reference table (outputs: model.toml)
    Calibrate {
        /// Path to the reference table CSV
        reference: String,

        /// Formula variant to calibrate
        #[arg(long, value_enum, default_value_t = CriterionArg::Second)]
        criterion: CriterionArg,

        /// Base vibration level in dB the measured spectra are expressed against
        #[arg(long, default_value_t = 86.0)]
        base_level: f64,

        /// Where to write the calibration artifact
        #[arg(long, default_value = "model.toml")]
        model_out: String,

        /// Also export B_D.csv, regression.csv and vibrations.csv to this directory
        #[arg(long)]
        export_dir: Option<String>,
    },

    /// Predict a candidate engine's vibration spectrum with a saved model
    Predict {
        /// Path to the candidate engine TOML file
        engine: String,

        /// Path to the calibration artifact
        #[arg(long, default_value = "model.toml")]
        model: String,
    },

    /// Print the theory text behind a criterion
    Theory {
        #[arg(long, value_enum, default_value_t = CriterionArg::Second)]
        criterion: CriterionArg,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Calibrate {
            reference,
            criterion,
            base_level,
            model_out,
            export_dir,
        } => calibrate_command(
            &reference,
            criterion.into(),
            base_level,
            &model_out,
            export_dir.as_deref(),
        ),
        Commands::Predict { engine, model } => predict_command(&engine, &model),
        Commands::Theory { criterion } => {
            theory::print_theory(criterion.into());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn calibrate_command(
    reference_path: &str,
    criterion: Criterion,
    base_level: f64,
    model_out: &str,
    export_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    println!("Loading reference table from: {reference_path}");
    let table = ReferenceTable::load(reference_path)?;
    println!("Loaded {} reference engines", table.engines().len());

    let config = CalibrationConfig {
        criterion,
        base_level_db: base_level,
    };
    log::info!("calibrating {} engines", table.engines().len());
    let calibration = calibrate(&table, &config)?;

    for fit in &calibration.model.groups {
        println!(
            "Group {}: {} engines, omega {:.4} rad/s",
            fit.group, fit.engines, fit.omega
        );
    }

    calibration.model.save(model_out)?;
    println!("Model saved to: {model_out}");

    if let Some(dir) = export_dir {
        export_results(dir, &table, criterion, &calibration.results)?;
        println!("Result tables exported to: {dir}");
    }

    Ok(())
}

fn predict_command(engine_path: &str, model_path: &str) -> Result<(), Box<dyn Error>> {
    println!("Loading model from: {model_path}");
    let model = CalibratedModel::load(model_path)?;

    let candidate = data::load_candidate(engine_path)?;
    log::info!("predicting spectrum for '{}'", candidate.name);
    let spectrum = model.predict(&candidate)?;

    println!("Predicted vibration levels for '{}':", candidate.name);
    for (band, level) in &spectrum {
        println!("{:>5} Hz  {:>12.4}", band.label(), level);
    }
    Ok(())
}
