// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Scores one customer with the persisted model:
//
//   CustomerRecord ──encode──▶ FeatureVector (10 wide)
//                  ──scale───▶ FeatureVector (DataShape check)
//                  ──forward─▶ logit ──sigmoid──▶ score in [0, 1]

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::data::{encoder::EncodingTable, scaler::StandardScaler};
use crate::domain::customer::{CustomerRecord, FeatureVector};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::prediction::ChurnPrediction;
use crate::domain::traits::ChurnScorer;
use crate::ml::model::ChurnModel;
use crate::ml::trainer::InferBackend;

pub struct Inferencer {
    model:     ChurnModel<InferBackend>,
    scaler:    StandardScaler,
    encodings: EncodingTable,
    device:    <InferBackend as Backend>::Device,
}

impl Inferencer {
    pub fn new(
        model:     ChurnModel<InferBackend>,
        scaler:    StandardScaler,
        encodings: EncodingTable,
    ) -> Self {
        Self { model, scaler, encodings, device: Default::default() }
    }

    /// Score an already-assembled, unscaled feature vector.
    /// The vector must be exactly as wide as the scaler was fitted.
    pub fn score_vector(&self, raw: &FeatureVector) -> ChurnResult<ChurnPrediction> {
        let scaled = self.scaler.transform(raw)?;
        let width  = scaled.len();

        let input = Tensor::<InferBackend, 2>::from_data(
            TensorData::new(scaled.into_inner(), [1, width]),
            &self.device,
        );
        let score = self
            .model
            .forward_proba(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ChurnError::Training(format!("cannot read prediction: {e:?}")))?
            .first()
            .copied()
            .ok_or_else(|| ChurnError::Training("model returned no output".into()))?;

        if !score.is_finite() {
            return Err(ChurnError::Training(format!("model produced a non-finite score ({score})")));
        }

        tracing::debug!("Raw churn score {:.6}", score);
        Ok(ChurnPrediction::from_score(score.clamp(0.0, 1.0)))
    }
}

impl ChurnScorer for Inferencer {
    fn score(&self, customer: &CustomerRecord) -> ChurnResult<ChurnPrediction> {
        customer.validate_input_ranges()?;
        let raw = self.encodings.encode_record(customer)?;
        self.score_vector(&raw)
    }
}
