// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and their flags. The customer
// flags are named after the schema columns in kebab case
// (MonthlyCharges → --monthly-charges) because exported scripts
// generate exactly those names.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::domain::customer::{ContractType, CustomerRecord};
use crate::domain::hyperparams::{
    validate_learning_rate, ActivationKind, HyperparameterConfig, OptimizerKind, BATCH_SIZES,
    MAX_EPOCHS, MIN_EPOCHS,
};
use crate::infra::exporter::DEFAULT_SCRIPT_NAME;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one customer with the saved model
    Predict(PredictArgs),

    /// Fetch the dataset, train and save a new artifact version
    Retrain(RetrainArgs),

    /// Write a standalone inference script for the saved model
    Export(ExportArgs),

    /// Print the training charts
    Report,
}

// ─── Customer ────────────────────────────────────────────────────────────────
#[derive(Args, Debug, Clone)]
pub struct CustomerArgs {
    /// Months with the company (0-72)
    #[arg(long, default_value_t = 12.0)]
    pub tenure: f32,

    /// Monthly charges (0-200)
    #[arg(long, default_value_t = 50.0)]
    pub monthly_charges: f32,

    /// Total charges (0-10000)
    #[arg(long, default_value_t = 500.0)]
    pub total_charges: f32,

    /// 1 if the customer is a senior citizen
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub senior_citizen: u8,

    /// Month-to-Month, One Year or Two Year
    #[arg(long, default_value = "Month-to-Month")]
    pub contract: ContractType,

    #[arg(long, default_value = "Electronic check")]
    pub payment_method: String,

    #[arg(long, default_value = "Fiber optic")]
    pub internet_service: String,

    #[arg(long, default_value = "No")]
    pub online_security: String,

    #[arg(long, default_value = "No")]
    pub tech_support: String,

    #[arg(long, default_value = "Yes")]
    pub paperless_billing: String,
}

impl From<CustomerArgs> for CustomerRecord {
    fn from(a: CustomerArgs) -> Self {
        CustomerRecord {
            tenure:            a.tenure,
            monthly_charges:   a.monthly_charges,
            total_charges:     a.total_charges,
            senior_citizen:    f32::from(a.senior_citizen),
            contract:          a.contract.dataset_label().to_string(),
            payment_method:    a.payment_method,
            internet_service:  a.internet_service,
            online_security:   a.online_security,
            tech_support:      a.tech_support,
            paperless_billing: a.paperless_billing,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub customer: CustomerArgs,

    /// Fail unless the saved artifacts were trained on this schema
    #[arg(long)]
    pub schema_fingerprint: Option<String>,
}

// ─── Retrain ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct RetrainArgs {
    /// Full passes over the training split
    #[arg(long, default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(MIN_EPOCHS as u64..=MAX_EPOCHS as u64))]
    pub epochs: u64,

    /// 16, 32 or 64
    #[arg(long, default_value_t = 32, value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Hidden-layer activation; only applies to a fresh model
    #[arg(long, default_value = "relu")]
    pub activation: ActivationKind,

    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    /// Dataset URL or local CSV path (defaults to the configured URL)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Override the optimizer's default learning rate
    #[arg(long, value_parser = parse_learning_rate)]
    pub learning_rate: Option<f64>,

    /// Ignore the saved model and start from new weights
    #[arg(long)]
    pub fresh: bool,

    /// Skip the charts after training
    #[arg(long)]
    pub no_charts: bool,
}

impl RetrainArgs {
    pub fn hyperparameters(&self) -> HyperparameterConfig {
        HyperparameterConfig {
            epochs:     self.epochs as usize,
            batch_size: self.batch_size,
            activation: self.activation,
            optimizer:  self.optimizer,
        }
    }
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if BATCH_SIZES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be one of {BATCH_SIZES:?}"))
    }
}

fn parse_learning_rate(s: &str) -> Result<f64, String> {
    let lr: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    validate_learning_rate(lr).map_err(|e| e.to_string())
}

// ─── Export ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Where to write the script
    #[arg(long, default_value = DEFAULT_SCRIPT_NAME)]
    pub output: PathBuf,
}
