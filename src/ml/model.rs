// ============================================================
// Layer 5 - Churn Classifier Architecture
// ============================================================
// A small fully connected network:
//
//   input [batch, 10]
//     → Linear(10, 16) → activation
//     → Linear(16, 8)  → activation
//     → Linear(8, 1)                 = logit [batch, 1]
//
// The sigmoid of the logit is the churn probability. Training uses
// binary cross-entropy on the logit for numerical stability.
//
// Weights are initialised Glorot-uniform from a seeded StdRng and
// biases start at zero, so two fresh models built with the same
// seed are bit-identical.
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    module::{Ignored, Param},
    nn::{loss::BinaryCrossEntropyLossConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{activation, TensorData},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::hyperparams::ActivationKind;

pub const DEFAULT_HIDDEN_SIZES: [usize; 2] = [16, 8];

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct ChurnModelConfig {
    pub input_dim:    usize,
    pub hidden_sizes: Vec<usize>,
    pub activation:   ActivationKind,
}

impl ChurnModelConfig {
    pub fn init<B: Backend>(&self, seed: u64, device: &B::Device) -> ChurnModel<B> {
        let mut rng  = StdRng::seed_from_u64(seed);
        let mut dims = vec![self.input_dim];
        dims.extend_from_slice(&self.hidden_sizes);
        dims.push(1);

        let layers = dims
            .windows(2)
            .map(|w| seeded_linear(w[0], w[1], &mut rng, device))
            .collect();

        ChurnModel { layers, activation: Ignored(self.activation) }
    }

    /// Same layer sizes and activation
    pub fn same_architecture(&self, other: &ChurnModelConfig) -> bool {
        self.input_dim == other.input_dim
            && self.hidden_sizes == other.hidden_sizes
            && self.activation == other.activation
    }
}

fn seeded_linear<B: Backend>(
    d_in:   usize,
    d_out:  usize,
    rng:    &mut StdRng,
    device: &B::Device,
) -> Linear<B> {
    let limit = (6.0 / (d_in + d_out) as f64).sqrt() as f32;
    let weights: Vec<f32> = (0..d_in * d_out).map(|_| rng.gen_range(-limit..limit)).collect();

    let mut linear = LinearConfig::new(d_in, d_out).init(device);
    linear.weight = Param::from_tensor(Tensor::<B, 2>::from_data(
        TensorData::new(weights, [d_in, d_out]),
        device,
    ));
    linear.bias = Some(Param::from_tensor(Tensor::<B, 1>::zeros([d_out], device)));
    linear
}

#[derive(Module, Debug)]
pub struct ChurnModel<B: Backend> {
    pub layers:     Vec<Linear<B>>,
    pub activation: Ignored<ActivationKind>,
}

impl<B: Backend> ChurnModel<B> {
    /// features: [batch, input_dim] → logits: [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let last  = self.layers.len().saturating_sub(1);
        let mut x = features;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if i < last {
                x = apply_activation(x, self.activation.0);
            }
        }
        x
    }

    /// features: [batch, input_dim] → churn probabilities: [batch, 1]
    pub fn forward_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(self.forward(features))
    }

    /// Mean binary cross-entropy of the batch plus the raw logits
    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        labels:   Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(features);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), labels);
        (loss, logits)
    }

    #[cfg(test)]
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weight.val().dims()[0])
    }
}

fn apply_activation<B: Backend>(x: Tensor<B, 2>, kind: ActivationKind) -> Tensor<B, 2> {
    match kind {
        ActivationKind::Relu    => activation::relu(x),
        ActivationKind::Sigmoid => activation::sigmoid(x),
        ActivationKind::Tanh    => activation::tanh(x),
    }
}
