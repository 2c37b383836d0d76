// ============================================================
// Layer 3 - Hyperparameter Configuration
// ============================================================
// The four knobs a user picks before retraining:
//   epochs      10..=100
//   batch size  16 | 32 | 64
//   activation  relu | sigmoid | tanh
//   optimizer   adam | sgd | rmsprop
//
// Activation is part of the model architecture, so it only takes
// effect when a fresh model is built. Retraining an existing model
// keeps the architecture it was persisted with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ChurnError, ChurnResult};

pub const MIN_EPOCHS: usize = 10;
pub const MAX_EPOCHS: usize = 100;
pub const BATCH_SIZES: [usize; 3] = [16, 32, 64];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    Relu,
    Sigmoid,
    Tanh,
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relu    => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh    => "tanh",
        })
    }
}

impl FromStr for ActivationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu"    => Ok(Self::Relu),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh"    => Ok(Self::Tanh),
            _ => Err(format!("unknown activation '{s}' (expected relu, sigmoid or tanh)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
    RmsProp,
}

impl OptimizerKind {
    /// Step size used when the user does not override it
    pub fn default_learning_rate(self) -> f64 {
        match self {
            Self::Adam    => 1e-3,
            Self::Sgd     => 1e-2,
            Self::RmsProp => 1e-3,
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adam    => "adam",
            Self::Sgd     => "sgd",
            Self::RmsProp => "rmsprop",
        })
    }
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam"    => Ok(Self::Adam),
            "sgd"     => Ok(Self::Sgd),
            "rmsprop" => Ok(Self::RmsProp),
            _ => Err(format!("unknown optimizer '{s}' (expected adam, sgd or rmsprop)")),
        }
    }
}

/// Hyperparameters for one retraining run.
/// Serialisable so the manifest records what produced each artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    pub epochs:     usize,
    pub batch_size: usize,
    pub activation: ActivationKind,
    pub optimizer:  OptimizerKind,
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self {
            epochs:     50,
            batch_size: 32,
            activation: ActivationKind::Relu,
            optimizer:  OptimizerKind::Adam,
        }
    }
}

impl HyperparameterConfig {
    pub fn validate(&self) -> ChurnResult<()> {
        if !(MIN_EPOCHS..=MAX_EPOCHS).contains(&self.epochs) {
            return Err(ChurnError::validation(
                "epochs",
                format!("{} is outside [{MIN_EPOCHS}, {MAX_EPOCHS}]", self.epochs),
            ));
        }
        if !BATCH_SIZES.contains(&self.batch_size) {
            return Err(ChurnError::validation(
                "batch_size",
                format!("{} is not one of {:?}", self.batch_size, BATCH_SIZES),
            ));
        }
        Ok(())
    }
}

/// A learning rate must be a finite, strictly positive number
pub fn validate_learning_rate(lr: f64) -> ChurnResult<f64> {
    if lr.is_finite() && lr > 0.0 {
        Ok(lr)
    } else {
        Err(ChurnError::validation("learning_rate", format!("{lr} is not a positive finite number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HyperparameterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_epochs_out_of_range() {
        let cfg = HyperparameterConfig { epochs: 5, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ChurnError::Validation { .. })));
        let cfg = HyperparameterConfig { epochs: 101, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_batch_size_must_be_offered_value() {
        let cfg = HyperparameterConfig { batch_size: 20, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("RMSprop".parse::<OptimizerKind>().unwrap(), OptimizerKind::RmsProp);
        assert_eq!("tanh".parse::<ActivationKind>().unwrap(), ActivationKind::Tanh);
        assert!("gelu".parse::<ActivationKind>().is_err());
    }

    #[test]
    fn test_learning_rate_must_be_positive_and_finite() {
        assert_eq!(validate_learning_rate(0.01).unwrap(), 0.01);
        for lr in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            assert!(matches!(validate_learning_rate(lr), Err(ChurnError::Validation { .. })));
        }
    }
}
