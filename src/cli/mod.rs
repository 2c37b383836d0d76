// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, resolves settings, and hands off to Layer 2.
//
// Four commands are supported:
//   1. `predict` - score one customer with the saved model
//   2. `retrain` - train and save a new artifact version
//   3. `export`  - write a standalone inference script
//   4. `report`  - print the training charts
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ExportArgs, PredictArgs, RetrainArgs};

use crate::application::{
    export_use_case::ExportUseCase,
    predict_use_case::PredictUseCase,
    report_use_case::{Report, ReportUseCase},
    retrain_job::RetrainJob,
    retrain_use_case::{RetrainRequest, RetrainUseCase},
};
use crate::domain::customer::CustomerRecord;
use crate::domain::progress::TrainingEvent;
use crate::infra::{artifact_store::ArtifactStore, settings::Settings};

#[derive(Parser, Debug)]
#[command(
    name = "churn-predict",
    version,
    about = "Train a feed-forward churn classifier on a CSV dataset, then score customers."
)]
pub struct Cli {
    /// Directory holding the saved model, scaler, encodings and metrics
    #[arg(long, global = true)]
    pub artifacts_dir: Option<PathBuf>,

    /// Settings file (default: ./Churn.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let store = ArtifactStore::new(
            self.artifacts_dir.clone().unwrap_or_else(|| settings.artifacts_dir.clone()),
        );

        match self.command {
            Commands::Predict(args) => run_predict(&store, args),
            Commands::Retrain(args) => run_retrain(store, &settings, args),
            Commands::Export(args)  => run_export(&store, args),
            Commands::Report        => run_report(&store),
        }
    }
}

fn run_predict(store: &ArtifactStore, args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase::new(store)?;
    use_case.check_fingerprint(args.schema_fingerprint.as_deref())?;
    let manifest = use_case.manifest();
    println!(
        "Model: artifacts version {} (trained {})",
        manifest.version,
        manifest.trained_at.format("%Y-%m-%d %H:%M UTC"),
    );

    let contract   = args.customer.contract;
    let customer   = CustomerRecord::from(args.customer);
    let prediction = use_case.predict(&customer)?;

    println!(
        "Contract: {}  Tenure: {}  Monthly: {:.2}  Total: {:.2}",
        contract, customer.tenure, customer.monthly_charges, customer.total_charges,
    );
    println!("{prediction}");
    Ok(())
}

fn run_retrain(store: ArtifactStore, settings: &Settings, args: RetrainArgs) -> Result<()> {
    let request = RetrainRequest {
        dataset:         args.dataset.clone().unwrap_or_else(|| settings.dataset_url.clone()),
        hyperparameters: args.hyperparameters(),
        learning_rate:   args.learning_rate.or(settings.learning_rate),
        fresh:           args.fresh,
        seed:            settings.seed,
        fetch_timeout:   Duration::from_secs(settings.fetch_timeout_secs),
    };
    tracing::info!("Retraining from {} into '{}'", request.dataset, store.dir().display());

    let use_case = RetrainUseCase::for_request(store, &request);
    let job      = RetrainJob::spawn(use_case, request);

    // First Ctrl-C stops cleanly after the current batch; a second one exits
    let canceller = job.canceller();
    if let Err(e) = ctrlc::set_handler(move || {
        if canceller.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("Cancelling after the current batch (Ctrl-C again to abort)");
        canceller.cancel();
    }) {
        tracing::warn!("Ctrl-C will not cancel retraining cleanly: {e}");
    }

    for event in job.events() {
        match event {
            TrainingEvent::Started { epochs, train_rows, val_rows } => {
                println!("Training {epochs} epochs on {train_rows} rows ({val_rows} held out)");
            }
            TrainingEvent::EpochFinished(m) => {
                println!(
                    "  epoch {:>3}  loss {:.4}  acc {:.4}  val_loss {:.4}  val_acc {:.4}",
                    m.epoch, m.loss, m.accuracy, m.val_loss, m.val_accuracy,
                );
            }
            TrainingEvent::Saved { version } => println!("Saved artifacts version {version}"),
        }
    }

    let outcome = job.join()?;
    if outcome.skipped_rows > 0 {
        println!("Skipped {} rows with missing numeric values", outcome.skipped_rows);
    }
    if let Some(best) = outcome.history.best_epoch() {
        println!(
            "Best validation loss {:.4} at epoch {} (val_acc {:.4})",
            best.val_loss, best.epoch, best.val_accuracy,
        );
    }
    if !args.no_charts {
        println!();
        print!("{}", Report::for_history(outcome.manifest.version, &outcome.history).render());
    }
    Ok(())
}

fn run_export(store: &ArtifactStore, args: ExportArgs) -> Result<()> {
    let binary = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "churn-predict".to_string());
    let path = ExportUseCase::new(store).execute(&args.output, &binary)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_report(store: &ArtifactStore) -> Result<()> {
    let report = ReportUseCase::new(store).execute()?;
    print!("{}", report.render());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{ContractType, FEATURE_COLUMNS};
    use crate::domain::hyperparams::ActivationKind;
    use crate::infra::exporter::cli_flag;

    #[test]
    fn test_predict_defaults() {
        let cli = Cli::try_parse_from(["churn-predict", "predict"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.customer.tenure, 12.0);
        assert_eq!(args.customer.monthly_charges, 50.0);
        assert_eq!(args.customer.total_charges, 500.0);
        assert_eq!(args.customer.contract, ContractType::MonthToMonth);
        assert!(args.schema_fingerprint.is_none());
    }

    #[test]
    fn test_every_schema_column_has_a_flag() {
        let values = ["12", "50", "500", "0", "Two year", "Mailed check", "DSL", "Yes", "No", "Yes"];
        let mut argv = vec!["churn-predict".to_string(), "predict".to_string()];
        for (column, value) in FEATURE_COLUMNS.iter().zip(values) {
            argv.push(format!("--{}", cli_flag(column)));
            argv.push(value.to_string());
        }
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        let record = CustomerRecord::from(args.customer);
        assert_eq!(record.contract, "Two year");
        assert_eq!(record.payment_method, "Mailed check");
        assert_eq!(record.paperless_billing, "Yes");
    }

    #[test]
    fn test_retrain_flag_bounds() {
        assert!(Cli::try_parse_from(["churn-predict", "retrain", "--epochs", "9"]).is_err());
        assert!(Cli::try_parse_from(["churn-predict", "retrain", "--epochs", "101"]).is_err());
        assert!(Cli::try_parse_from(["churn-predict", "retrain", "--batch-size", "20"]).is_err());
        assert!(Cli::try_parse_from(["churn-predict", "retrain", "--activation", "gelu"]).is_err());
        for lr in ["NaN", "inf", "0", "-0.01", "fast"] {
            assert!(Cli::try_parse_from(["churn-predict", "retrain", "--learning-rate", lr]).is_err(), "accepted {lr}");
        }

        let cli = Cli::try_parse_from([
            "churn-predict", "--artifacts-dir", "/tmp/a", "retrain",
            "--epochs", "10", "--batch-size", "64", "--activation", "tanh", "--optimizer", "rmsprop",
        ])
        .unwrap();
        assert_eq!(cli.artifacts_dir, Some(PathBuf::from("/tmp/a")));
        let Commands::Retrain(args) = cli.command else { panic!("expected retrain") };
        let hp = args.hyperparameters();
        assert_eq!(hp.epochs, 10);
        assert_eq!(hp.batch_size, 64);
        assert_eq!(hp.activation, ActivationKind::Tanh);
        assert!(hp.validate().is_ok());
        assert_eq!(args.learning_rate, None);

        let cli = Cli::try_parse_from(["churn-predict", "retrain", "--learning-rate", "0.005"]).unwrap();
        let Commands::Retrain(args) = cli.command else { panic!("expected retrain") };
        assert_eq!(args.learning_rate, Some(0.005));
    }

    #[test]
    fn test_contract_flag_accepts_ui_spelling() {
        for spelling in ["Two Year", "two-year", "Two year"] {
            let cli = Cli::try_parse_from(["churn-predict", "predict", "--contract", spelling]).unwrap();
            let Commands::Predict(args) = cli.command else { panic!("expected predict") };
            assert_eq!(args.customer.contract, ContractType::TwoYear);
        }
    }
}
