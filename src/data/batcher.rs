// ============================================================
// Layer 4 - Churn Batcher
// ============================================================
// Stacks a Vec of samples into tensors for one forward pass.
//
// How batching works here:
//   Input:  N samples, each with F features
//   Output: features [N, F] (float), labels [N, 1] (int)
//
//   We flatten all feature rows into one long Vec, then reshape:
//   [s1_f1, s1_f2, ..., s1_fF, s2_f1, ..., sN_fF] → [N, F]
//
// The labels are also kept as plain f32 so accuracy can be
// counted on the host without another tensor round trip.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::ChurnSample;

#[derive(Debug, Clone)]
pub struct ChurnBatch<B: Backend> {
    /// Scaled features, shape [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// Binary targets, shape [batch_size, 1]
    pub labels: Tensor<B, 2, Int>,

    /// Same targets on the host
    pub targets: Vec<f32>,
}

/// Stateless: the DataLoader hands over the target device per batch
#[derive(Clone, Debug, Default)]
pub struct ChurnBatcher;

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// This is what makes ChurnBatcher work with Burn's DataLoader.
impl<B: Backend> Batcher<B, ChurnSample, ChurnBatch<B>> for ChurnBatcher {
    /// `items` is never empty; every sample has the same width
    fn batch(&self, items: Vec<ChurnSample>, device: &B::Device) -> ChurnBatch<B> {
        let batch_size = items.len();
        let n_features = items.first().map_or(0, |s| s.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let targets: Vec<f32> = items.iter().map(|s| s.label).collect();
        let label_ints: Vec<i32> = targets.iter().map(|&t| t as i32).collect();

        let features = Tensor::<B, 2>::from_data(TensorData::new(flat, [batch_size, n_features]), device);
        let labels   = Tensor::<B, 2, Int>::from_data(TensorData::new(label_ints, [batch_size, 1]), device);

        ChurnBatch { features, labels, targets }
    }
}
