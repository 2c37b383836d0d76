// ============================================================
// Layer 3 - Churn Prediction
// ============================================================
// A score in [0, 1] plus the branch it selects. The threshold is
// fixed: strictly above 0.5 is a churn risk, 0.5 itself is not.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const CHURN_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    HighChurnRisk,
    LikelyToStay,
}

impl RiskLevel {
    pub fn from_score(score: f32) -> Self {
        if score > CHURN_THRESHOLD {
            Self::HighChurnRisk
        } else {
            Self::LikelyToStay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub score: f32,
    pub risk:  RiskLevel,
}

impl ChurnPrediction {
    pub fn from_score(score: f32) -> Self {
        Self { score, risk: RiskLevel::from_score(score) }
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk == RiskLevel::HighChurnRisk
    }
}

impl fmt::Display for ChurnPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_high_risk() {
            write!(f, "High chance of churn (Score: {:.2})", self.score)
        } else {
            write!(f, "Customer likely to stay (Score: {:.2})", self.score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_maps_to_likely_to_stay() {
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::LikelyToStay);
    }

    #[test]
    fn test_just_above_threshold_is_high_risk() {
        assert_eq!(RiskLevel::from_score(0.500_001), RiskLevel::HighChurnRisk);
    }

    #[test]
    fn test_message_format() {
        let p = ChurnPrediction::from_score(0.734);
        assert!(p.is_high_risk());
        assert_eq!(p.to_string(), "High chance of churn (Score: 0.73)");
        let p = ChurnPrediction::from_score(0.2);
        assert_eq!(p.to_string(), "Customer likely to stay (Score: 0.20)");
    }
}
