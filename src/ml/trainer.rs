// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Mini-batch training with validation after every epoch.
//
// Key points:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on InferBackend (NdArray)
//     and is used for the validation pass
//   - Both splits go through Burn's DataLoader; the training loader
//     is seeded once per run and reshuffles every epoch, so a run is
//     reproducible end to end
//   - The cancel flag is checked before every batch
//   - A non-finite epoch loss aborts the run
//
// The optimizer is picked at runtime, but each burn optimizer is a
// different type, so the loop itself is generic over Optimizer.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer, RmsPropConfig, SgdConfig},
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::{ChurnBatch, ChurnBatcher};
use crate::data::dataset::ChurnDataset;
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::history::{EpochMetrics, TrainingHistory};
use crate::domain::hyperparams::{validate_learning_rate, OptimizerKind};
use crate::domain::prediction::CHURN_THRESHOLD;
use crate::domain::progress::{TrainingControl, TrainingEvent};
use crate::ml::model::ChurnModel;

pub type TrainBackend = Autodiff<NdArray>;
pub type InferBackend = NdArray;

type Loader<B> = Arc<dyn DataLoader<B, ChurnBatch<B>>>;

#[derive(Debug, Clone)]
pub struct TrainerSettings {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub optimizer:     OptimizerKind,
    pub learning_rate: f64,
    pub shuffle_seed:  u64,
}

/// Train `model` and return it on the inference backend with its history.
pub fn fit(
    model:    ChurnModel<TrainBackend>,
    train:    ChurnDataset,
    val:      ChurnDataset,
    settings: &TrainerSettings,
    control:  &TrainingControl,
) -> ChurnResult<(ChurnModel<InferBackend>, TrainingHistory)> {
    if train.is_empty() || val.is_empty() {
        return Err(ChurnError::validation(
            "dataset",
            format!("need rows in both splits (train={}, validation={})", train.len(), val.len()),
        ));
    }
    if settings.batch_size == 0 {
        return Err(ChurnError::validation("batch_size", "must be positive"));
    }
    validate_learning_rate(settings.learning_rate)?;

    tracing::info!(
        "Training for {} epochs (batch={}, optimizer={}, lr={})",
        settings.epochs, settings.batch_size, settings.optimizer, settings.learning_rate,
    );

    // ── Training data loader (AutodiffBackend, reshuffled every epoch) ───────
    let train_loader: Loader<TrainBackend> = DataLoaderBuilder::new(ChurnBatcher)
        .batch_size(settings.batch_size)
        .shuffle(settings.shuffle_seed)
        .build(train);

    // ── Validation data loader (InferBackend, no autodiff overhead) ──────────
    let val_loader: Loader<InferBackend> = DataLoaderBuilder::new(ChurnBatcher)
        .batch_size(settings.batch_size)
        .build(val);

    match settings.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().init::<TrainBackend, ChurnModel<TrainBackend>>();
            train_loop(model, optim, &train_loader, &val_loader, settings, control)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().init::<TrainBackend, ChurnModel<TrainBackend>>();
            train_loop(model, optim, &train_loader, &val_loader, settings, control)
        }
        OptimizerKind::RmsProp => {
            let optim = RmsPropConfig::new().init::<TrainBackend, ChurnModel<TrainBackend>>();
            train_loop(model, optim, &train_loader, &val_loader, settings, control)
        }
    }
}

fn train_loop<O>(
    mut model:    ChurnModel<TrainBackend>,
    mut optim:    O,
    train_loader: &Loader<TrainBackend>,
    val_loader:   &Loader<InferBackend>,
    settings:     &TrainerSettings,
    control:      &TrainingControl,
) -> ChurnResult<(ChurnModel<InferBackend>, TrainingHistory)>
where
    O: Optimizer<ChurnModel<TrainBackend>, TrainBackend>,
{
    let mut history = TrainingHistory::new();

    for epoch in 1..=settings.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            if control.is_cancelled() {
                tracing::info!("Training cancelled during epoch {}", epoch);
                return Err(ChurnError::Cancelled);
            }

            let rows = batch.targets.len();
            let (loss, logits) = model.forward_loss(batch.features, batch.labels);

            loss_sum += loss.clone().into_scalar().elem::<f64>() * rows as f64;
            correct  += count_correct(logits, &batch.targets)?;
            seen     += rows;

            // Backward pass + optimizer update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let (val_loss, val_accuracy) = evaluate(&model.valid(), val_loader)?;

        let metrics = EpochMetrics::new(
            epoch,
            loss_sum / seen.max(1) as f64,
            correct as f64 / seen.max(1) as f64,
            val_loss,
            val_accuracy,
        );

        tracing::info!(
            "Epoch {:>3}/{} | loss={:.4} | accuracy={:.1}% | val_loss={:.4} | val_accuracy={:.1}%",
            epoch, settings.epochs, metrics.loss, metrics.accuracy * 100.0,
            metrics.val_loss, metrics.val_accuracy * 100.0,
        );

        // A diverged model must never reach the artifact store
        if !metrics.loss.is_finite() || !metrics.val_loss.is_finite() {
            return Err(ChurnError::Training(format!(
                "loss diverged at epoch {epoch} (loss={}, val_loss={}); try a lower learning rate",
                metrics.loss, metrics.val_loss,
            )));
        }

        control.emit(TrainingEvent::EpochFinished(metrics.clone()));
        history.push(metrics);
    }

    Ok((model.valid(), history))
}

/// Mean loss and accuracy of `model` over every batch of `loader`
fn evaluate(
    model:  &ChurnModel<InferBackend>,
    loader: &Loader<InferBackend>,
) -> ChurnResult<(f64, f64)> {
    let bce = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&NdArrayDevice::default());

    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut seen     = 0usize;

    for batch in loader.iter() {
        let rows   = batch.targets.len();
        let logits = model.forward(batch.features);
        let loss: f64 = bce
            .forward(logits.clone(), batch.labels)
            .into_scalar()
            .elem::<f64>();
        loss_sum += loss * rows as f64;
        correct  += count_correct(logits, &batch.targets)?;
        seen     += rows;
    }

    if seen == 0 {
        return Ok((f64::NAN, 0.0));
    }
    Ok((loss_sum / seen as f64, correct as f64 / seen as f64))
}

/// Rows where (p > 0.5) agrees with the label
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: &[f32]) -> ChurnResult<usize> {
    let probs: Vec<f32> = activation::sigmoid(logits)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| ChurnError::Training(format!("cannot read predictions: {e:?}")))?;

    Ok(probs
        .iter()
        .zip(targets)
        .filter(|(p, t)| (**p > CHURN_THRESHOLD) == (**t > CHURN_THRESHOLD))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hyperparams::ActivationKind;
    use crate::data::dataset::ChurnSample;
    use crate::ml::model::{ChurnModelConfig, DEFAULT_HIDDEN_SIZES};

    /// Linearly separable toy data: label = 1 when the first feature is positive
    fn toy(n: usize, offset: usize) -> ChurnDataset {
        let samples = (0..n)
            .map(|i| {
                let x = ((i + offset) as f32 / n as f32) * 2.0 - 1.0;
                ChurnSample {
                    features: vec![x, -x, 0.5 * x, 0.0],
                    label:    if x > 0.0 { 1.0 } else { 0.0 },
                }
            })
            .collect();
        ChurnDataset::new(samples)
    }

    fn settings(optimizer: OptimizerKind, epochs: usize) -> TrainerSettings {
        TrainerSettings {
            epochs,
            batch_size:    16,
            optimizer,
            learning_rate: optimizer.default_learning_rate() * 10.0,
            shuffle_seed:  42,
        }
    }

    fn fresh_model() -> ChurnModel<TrainBackend> {
        ChurnModelConfig::new(4, DEFAULT_HIDDEN_SIZES.to_vec(), ActivationKind::Relu)
            .init(42, &NdArrayDevice::default())
    }

    #[test]
    fn test_history_has_one_entry_per_epoch() {
        let (_, history) = fit(fresh_model(), toy(64, 0), toy(16, 3), &settings(OptimizerKind::Adam, 12), &TrainingControl::default()).unwrap();
        assert_eq!(history.len(), 12);
        assert_eq!(history.epochs[0].epoch, 1);
        assert!(history.epochs.iter().all(|m| (0.0..=1.0).contains(&m.val_accuracy)));
    }

    #[test]
    fn test_loss_goes_down_on_separable_data() {
        let (_, history) = fit(fresh_model(), toy(64, 0), toy(16, 3), &settings(OptimizerKind::Adam, 30), &TrainingControl::default()).unwrap();
        let first = history.epochs.first().unwrap().loss;
        let last  = history.last().unwrap().loss;
        assert!(last < first, "loss did not improve: {first} -> {last}");
    }

    #[test]
    fn test_same_seed_same_history() {
        for optimizer in [OptimizerKind::Adam, OptimizerKind::Sgd, OptimizerKind::RmsProp] {
            let s = settings(optimizer, 10);
            let (_, a) = fit(fresh_model(), toy(48, 0), toy(12, 1), &s, &TrainingControl::default()).unwrap();
            let (_, b) = fit(fresh_model(), toy(48, 0), toy(12, 1), &s, &TrainingControl::default()).unwrap();
            assert_eq!(a, b, "history differs for {optimizer}");
        }
    }

    #[test]
    fn test_cancelled_run_stops() {
        let control = TrainingControl::default();
        control.cancel();
        let result = fit(fresh_model(), toy(32, 0), toy(8, 0), &settings(OptimizerKind::Sgd, 10), &control);
        assert!(matches!(result, Err(ChurnError::Cancelled)));
    }

    #[test]
    fn test_progress_events_are_emitted() {
        let (tx, rx) = std::sync::mpsc::channel();
        let control  = TrainingControl::new(Default::default(), Some(tx));
        fit(fresh_model(), toy(32, 0), toy(8, 0), &settings(OptimizerKind::Adam, 10), &control).unwrap();
        drop(control);
        let epochs: Vec<usize> = rx
            .iter()
            .filter_map(|e| match e {
                TrainingEvent::EpochFinished(m) => Some(m.epoch),
                _ => None,
            })
            .collect();
        assert_eq!(epochs, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_validation_split_is_rejected() {
        let result = fit(fresh_model(), toy(32, 0), ChurnDataset::new(Vec::new()), &settings(OptimizerKind::Adam, 10), &TrainingControl::default());
        assert!(matches!(result, Err(ChurnError::Validation { .. })));
    }

    #[test]
    fn test_invalid_learning_rate_is_rejected() {
        for lr in [f64::NAN, f64::INFINITY, 0.0, -0.01] {
            let s = TrainerSettings { learning_rate: lr, ..settings(OptimizerKind::Adam, 10) };
            let result = fit(fresh_model(), toy(32, 0), toy(8, 0), &s, &TrainingControl::default());
            assert!(matches!(result, Err(ChurnError::Validation { .. })), "lr {lr} was accepted");
        }
    }

    #[test]
    fn test_non_finite_loss_aborts_the_run() {
        let mut samples = toy(32, 0).into_samples();
        samples[0].features[0] = f32::NAN;
        let (tx, rx) = std::sync::mpsc::channel();
        let control  = TrainingControl::new(Default::default(), Some(tx));

        let result = fit(fresh_model(), ChurnDataset::new(samples), toy(8, 0), &settings(OptimizerKind::Sgd, 10), &control);
        drop(control);

        assert!(matches!(result, Err(ChurnError::Training(_))));
        assert!(!rx.iter().any(|e| matches!(e, TrainingEvent::EpochFinished(_))));
    }
}
