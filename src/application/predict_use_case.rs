// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Loads the current artifact version once and scores customers
// with it. Never trains: a store without artifacts is an error.

use anyhow::{Context, Result};

use crate::domain::customer::{schema_fingerprint, CustomerRecord};
use crate::domain::error::ChurnError;
use crate::domain::prediction::ChurnPrediction;
use crate::domain::traits::ChurnScorer;
use crate::infra::artifact_store::{ArtifactManifest, ArtifactStore};
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    manifest:   ArtifactManifest,
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(store: &ArtifactStore) -> Result<Self> {
        let loaded = store
            .load()
            .with_context(|| format!("Cannot load artifacts from '{}'", store.dir().display()))?;
        let inferencer = Inferencer::new(loaded.model, loaded.scaler, loaded.encodings);
        Ok(Self { manifest: loaded.manifest, inferencer })
    }

    /// Callers built against a specific schema (exported scripts) pass its
    /// fingerprint; it must match the one the artifacts were trained with.
    pub fn check_fingerprint(&self, expected: Option<&str>) -> Result<()> {
        let Some(expected) = expected else {
            return Ok(());
        };
        if expected != self.manifest.schema_fingerprint {
            return Err(ChurnError::validation(
                "schema_fingerprint",
                format!(
                    "caller expects schema {expected} but artifacts version {} use {} \
                     (this build: {}). Re-export the script.",
                    self.manifest.version,
                    self.manifest.schema_fingerprint,
                    schema_fingerprint(),
                ),
            )
            .into());
        }
        Ok(())
    }

    pub fn predict(&self, customer: &CustomerRecord) -> Result<ChurnPrediction> {
        let prediction = self.inferencer.score(customer)?;
        tracing::info!(
            "Scored customer with artifacts version {}: {:.4}",
            self.manifest.version,
            prediction.score,
        );
        Ok(prediction)
    }

    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::retrain_use_case::tests::{quick_request, use_case};
    use crate::domain::customer::{ContractType, FeatureVector};
    use crate::domain::progress::TrainingControl;
    use tempfile::{tempdir, TempDir};

    fn trained_store() -> (TempDir, ArtifactStore) {
        let dir = tempdir().unwrap();
        use_case(dir.path()).execute(&quick_request(), &TrainingControl::default()).unwrap();
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    fn two_year_customer() -> CustomerRecord {
        CustomerRecord {
            tenure:            12.0,
            monthly_charges:   50.0,
            total_charges:     500.0,
            senior_citizen:    0.0,
            contract:          ContractType::TwoYear.dataset_label().into(),
            payment_method:    "Electronic check".into(),
            internet_service:  "Fiber optic".into(),
            online_security:   "No".into(),
            tech_support:      "No".into(),
            paperless_billing: "Yes".into(),
        }
    }

    #[test]
    fn test_missing_artifacts_is_persistence_error() {
        let dir = tempdir().unwrap();
        let err = PredictUseCase::new(&ArtifactStore::new(dir.path())).err().unwrap();
        assert!(matches!(err.downcast_ref::<ChurnError>(), Some(ChurnError::Persistence { .. })));
    }

    #[test]
    fn test_two_year_scenario_is_deterministic() {
        let (_dir, store) = trained_store();
        let a = PredictUseCase::new(&store).unwrap();
        let b = PredictUseCase::new(&store).unwrap();

        let pa = a.predict(&two_year_customer()).unwrap();
        let pb = b.predict(&two_year_customer()).unwrap();
        assert_eq!(pa, pb);
        assert!((0.0..=1.0).contains(&pa.score));
        assert_eq!(pa.is_high_risk(), pa.score > 0.5);
    }

    #[test]
    fn test_four_feature_vector_is_shape_error() {
        let (_dir, store) = trained_store();
        let uc  = PredictUseCase::new(&store).unwrap();
        let err = uc.inferencer.score_vector(&FeatureVector::new(vec![12.0, 50.0, 500.0, 2.0])).unwrap_err();
        assert!(matches!(err, ChurnError::DataShape { expected: 10, actual: 4 }));
    }

    #[test]
    fn test_fingerprint_must_match() {
        let (_dir, store) = trained_store();
        let uc = PredictUseCase::new(&store).unwrap();
        assert_eq!(uc.manifest().version, 1);
        assert_eq!(uc.manifest().schema_fingerprint, schema_fingerprint());
        assert!(uc.check_fingerprint(None).is_ok());
        assert!(uc.check_fingerprint(Some(&schema_fingerprint())).is_ok());
        assert!(uc.check_fingerprint(Some("0000000000000000")).is_err());
    }

    #[test]
    fn test_out_of_range_tenure_is_rejected() {
        let (_dir, store) = trained_store();
        let uc = PredictUseCase::new(&store).unwrap();
        let mut customer = two_year_customer();
        customer.tenure  = 73.0;
        let err = uc.predict(&customer).unwrap_err();
        assert!(matches!(err.downcast_ref::<ChurnError>(), Some(ChurnError::Validation { .. })));
    }
}
