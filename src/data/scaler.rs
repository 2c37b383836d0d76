// ============================================================
// Layer 4 - Standard Scaler
// ============================================================
// Zero-mean / unit-variance normalisation per column:
//
//   x' = (x - mean) / std
//
// Fitted on the training split only, then applied unchanged to the
// validation split and to every inference input. The standard
// deviation is the population one (divide by n); a constant column
// gets scale 1.0 so it maps to 0 instead of dividing by zero.
//
// Width is checked on every transform: a vector with a different
// column count than the fitted one is a DataShape error and is
// never padded or truncated.

use serde::{Deserialize, Serialize};

use crate::domain::customer::FeatureVector;
use crate::domain::error::{ChurnError, ChurnResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean:           Vec<f32>,
    scale:          Vec<f32>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Fit column statistics on `rows` (all rows must share one width)
    pub fn fit(rows: &[Vec<f32>]) -> ChurnResult<Self> {
        let first = rows.first().ok_or_else(|| {
            ChurnError::validation("dataset", "cannot fit a scaler on zero rows")
        })?;
        let width = first.len();

        let mut sum = vec![0.0f64; width];
        for row in rows {
            if row.len() != width {
                return Err(ChurnError::DataShape { expected: width, actual: row.len() });
            }
            for (s, &x) in sum.iter_mut().zip(row) {
                *s += x as f64;
            }
        }
        let n    = rows.len() as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();

        let mut sq = vec![0.0f64; width];
        for row in rows {
            for ((acc, &x), m) in sq.iter_mut().zip(row).zip(&mean) {
                let d = x as f64 - m;
                *acc += d * d;
            }
        }
        let scale: Vec<f32> = sq
            .iter()
            .map(|acc| {
                let std = (acc / n).sqrt();
                if std > f64::EPSILON { std as f32 } else { 1.0 }
            })
            .collect();

        Ok(Self {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            scale,
            n_samples_seen: rows.len(),
        })
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    #[cfg(test)]
    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn transform(&self, v: &FeatureVector) -> ChurnResult<FeatureVector> {
        let mut values = v.as_slice().to_vec();
        self.transform_in_place(&mut values)?;
        Ok(FeatureVector::new(values))
    }

    pub fn transform_in_place(&self, row: &mut [f32]) -> ChurnResult<()> {
        if row.len() != self.width() {
            return Err(ChurnError::DataShape { expected: self.width(), actual: row.len() });
        }
        for ((x, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - m) / s;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> StandardScaler {
        StandardScaler::fit(&[vec![1.0, 10.0, 5.0], vec![3.0, 30.0, 5.0]]).unwrap()
    }

    #[test]
    fn test_fit_mean_and_scale() {
        let s   = fitted();
        let out = s.transform(&FeatureVector::new(vec![1.0, 10.0, 5.0])).unwrap();
        assert_eq!(out.as_slice(), &[-1.0, -1.0, 0.0]);
        assert_eq!(s.n_samples_seen(), 2);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let s   = fitted();
        let out = s.transform(&FeatureVector::new(vec![2.0, 20.0, 5.0])).unwrap();
        assert_eq!(out.as_slice()[2], 0.0);
    }

    #[test]
    fn test_narrow_vector_is_rejected_not_padded() {
        let rows: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32; 10]).collect();
        let s = StandardScaler::fit(&rows).unwrap();
        let short = FeatureVector::new(vec![12.0, 50.0, 500.0, 2.0]);
        match s.transform(&short) {
            Err(ChurnError::DataShape { expected, actual }) => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 4);
            }
            other => panic!("expected DataShape error, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_rows_fail_fit() {
        let err = StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, ChurnError::DataShape { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_json_round_trip_gives_identical_transform() {
        let s     = fitted();
        let json  = serde_json::to_string(&s).unwrap();
        let back: StandardScaler = serde_json::from_str(&json).unwrap();
        let input = FeatureVector::new(vec![2.5, 17.0, 4.0]);
        assert_eq!(s.transform(&input).unwrap(), back.transform(&input).unwrap());
    }
}
