// ============================================================
// Layer 2 - RetrainUseCase
// ============================================================
// Orchestrates one retraining run in order:
//
//   Step 1: Validate hyperparameters         (Layer 3 - domain)
//   Step 2: Note the current store version   (Layer 6 - infra)
//   Step 3: Fetch + parse the CSV            (Layer 4 - data)
//   Step 4: Fit the encoding table           (Layer 4 - data)
//   Step 5: Split train/validation (seed)    (Layer 4 - data)
//   Step 6: Fit the scaler on train only     (Layer 4 - data)
//   Step 7: Load or build the model          (Layer 5/6)
//   Step 8: Run the training loop            (Layer 5 - ml)
//   Step 9: Save a new artifact version      (Layer 6 - infra)
//
// Nothing is written before step 9, so any failure (or a cancel)
// leaves the previously saved version exactly as it was.

use std::time::Duration;

use anyhow::{Context, Result};
use burn::{backend::ndarray::NdArrayDevice, data::dataset::Dataset};

use crate::data::{
    dataset::{parse_rows, ChurnDataset, ChurnRow},
    encoder::EncodingTable,
    loader::{open_source, DEFAULT_DATASET_URL},
    scaler::StandardScaler,
    splitter::{split_train_val, SPLIT_SEED, VALIDATION_FRACTION},
};
use crate::domain::customer::FEATURE_WIDTH;
use crate::domain::error::ChurnError;
use crate::domain::history::TrainingHistory;
use crate::domain::hyperparams::{validate_learning_rate, HyperparameterConfig};
use crate::domain::progress::{TrainingControl, TrainingEvent};
use crate::domain::traits::DatasetSource;
use crate::infra::{
    artifact_store::{ArtifactBundle, ArtifactManifest, ArtifactStore},
    metrics::MetricsLogger,
};
use crate::ml::model::{ChurnModel, ChurnModelConfig, DEFAULT_HIDDEN_SIZES};
use crate::ml::trainer::{fit, TrainBackend, TrainerSettings};

// ─── Request / Outcome ───────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct RetrainRequest {
    /// URL or local path of the CSV
    pub dataset:         String,
    pub hyperparameters: HyperparameterConfig,
    /// None → the optimizer's default
    pub learning_rate:   Option<f64>,
    /// Ignore any saved model and start from fresh weights
    pub fresh:           bool,
    pub seed:            u64,
    pub fetch_timeout:   Duration,
}

impl Default for RetrainRequest {
    fn default() -> Self {
        Self {
            dataset:         DEFAULT_DATASET_URL.to_string(),
            hyperparameters: HyperparameterConfig::default(),
            learning_rate:   None,
            fresh:           false,
            seed:            SPLIT_SEED,
            fetch_timeout:   Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrainOutcome {
    pub manifest:     ArtifactManifest,
    pub history:      TrainingHistory,
    pub skipped_rows: usize,
}

// ─── RetrainUseCase ──────────────────────────────────────────────────────────
pub struct RetrainUseCase {
    store:  ArtifactStore,
    source: Box<dyn DatasetSource>,
}

impl RetrainUseCase {
    pub fn new(store: ArtifactStore, source: Box<dyn DatasetSource>) -> Self {
        Self { store, source }
    }

    /// Source picked from the request's dataset reference
    pub fn for_request(store: ArtifactStore, request: &RetrainRequest) -> Self {
        Self::new(store, open_source(&request.dataset, request.fetch_timeout))
    }

    pub fn execute(&self, request: &RetrainRequest, control: &TrainingControl) -> Result<RetrainOutcome> {
        let hp = &request.hyperparameters;

        // ── Step 1: Validate hyperparameters ─────────────────────────────────
        hp.validate()?;
        let learning_rate = match request.learning_rate {
            Some(lr) => validate_learning_rate(lr)?,
            None     => hp.optimizer.default_learning_rate(),
        };

        // ── Step 2: Remember which version this run builds on ────────────────
        let expected_version = self.store.current_version()?;

        // ── Step 3: Fetch + parse ────────────────────────────────────────────
        tracing::info!("Fetching dataset from {}", self.source.describe());
        let text   = self.source.fetch()?;
        let parsed = parse_rows(&text).context("Dataset could not be parsed")?;
        tracing::info!("Parsed {} usable rows", parsed.rows.len());

        // ── Step 4: Fit the encoding table on every usable row ───────────────
        let encodings = EncodingTable::fit(&parsed.rows)?;

        // ── Step 5: Split 80/20 ──────────────────────────────────────────────
        let (train_rows, val_rows): (Vec<ChurnRow>, Vec<ChurnRow>) =
            split_train_val(parsed.rows, VALIDATION_FRACTION, request.seed);
        tracing::info!("Split: {} train, {} validation", train_rows.len(), val_rows.len());

        let train = ChurnDataset::encode(&train_rows, &encodings)?;
        let val   = ChurnDataset::encode(&val_rows, &encodings)?;

        // ── Step 6: Scale with statistics of the training split only ─────────
        let scaler = StandardScaler::fit(&train.feature_rows())?;
        let train  = scale_dataset(train, &scaler)?;
        let val    = scale_dataset(val, &scaler)?;
        tracing::debug!("Training churn rate {:.3}", train.churn_rate());

        // ── Step 7: Model ────────────────────────────────────────────────────
        let device = NdArrayDevice::default();
        let (model, model_config) = self.starting_model(request, expected_version, &device)?;

        // ── Step 8: Train ────────────────────────────────────────────────────
        let settings = TrainerSettings {
            epochs:        hp.epochs,
            batch_size:    hp.batch_size,
            optimizer:     hp.optimizer,
            learning_rate,
            shuffle_seed:  request.seed,
        };
        let (train_len, val_len) = (train.len(), val.len());
        control.emit(TrainingEvent::Started {
            epochs:     hp.epochs,
            train_rows: train_len,
            val_rows:   val_len,
        });
        let (trained, history) = fit(model, train, val, &settings, control)?;

        if control.is_cancelled() {
            return Err(ChurnError::Cancelled.into());
        }

        // ── Step 9: Persist ──────────────────────────────────────────────────
        let manifest = self
            .store
            .save(
                expected_version,
                ArtifactBundle {
                    model:           &trained,
                    model_config:    &model_config,
                    scaler:          &scaler,
                    encodings:       &encodings,
                    hyperparameters: hp,
                    learning_rate:   settings.learning_rate,
                    train_rows:      train_len,
                    val_rows:        val_len,
                },
            )
            .context("Could not save the retrained model")?;
        control.emit(TrainingEvent::Saved { version: manifest.version });

        if let Err(e) = MetricsLogger::new(self.store.dir()).log_history(manifest.version, &history) {
            tracing::warn!("Model saved but metrics were not logged: {e}");
        }

        Ok(RetrainOutcome { manifest, history, skipped_rows: parsed.skipped })
    }

    /// Continue from the saved model unless asked for a fresh start
    fn starting_model(
        &self,
        request:          &RetrainRequest,
        expected_version: Option<u64>,
        device:           &NdArrayDevice,
    ) -> Result<(ChurnModel<TrainBackend>, ChurnModelConfig)> {
        let requested = ChurnModelConfig::new(
            FEATURE_WIDTH,
            DEFAULT_HIDDEN_SIZES.to_vec(),
            request.hyperparameters.activation,
        );

        if !request.fresh && expected_version.is_some() {
            let (manifest, model) = self.store.load_current_model::<TrainBackend>(device)?;
            if !manifest.model_config.same_architecture(&requested) {
                tracing::warn!(
                    "Keeping the saved model's architecture ({} activation); pass --fresh to train a new {} model",
                    manifest.model_config.activation,
                    requested.activation,
                );
            }
            tracing::info!("Continuing from artifacts version {}", manifest.version);
            return Ok((model, manifest.model_config));
        }

        tracing::info!("Building a fresh model ({} activation)", requested.activation);
        let model = requested.init::<TrainBackend>(request.seed, device);
        Ok((model, requested))
    }
}

fn scale_dataset(dataset: ChurnDataset, scaler: &StandardScaler) -> Result<ChurnDataset> {
    let mut samples = dataset.into_samples();
    for sample in &mut samples {
        scaler.transform_in_place(&mut sample.features)?;
    }
    Ok(ChurnDataset::new(samples))
}
