// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends the per-epoch history of every retraining run to
// metrics.csv in the artifact directory, tagged with the artifact
// version the run produced. `report` reads the latest run back.
//
// Example CSV output:
//   run_version,epoch,loss,accuracy,val_loss,val_accuracy
//   3,1,0.612300,0.701000,0.598800,0.712000
//   3,2,0.534100,0.748000,0.541200,0.739000
//   ...
//
// How to read the metrics:
//   - loss should fall every epoch
//   - val_loss rising while loss keeps falling means overfitting
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::error::{ChurnError, ChurnResult};
use crate::domain::history::{EpochMetrics, TrainingHistory};

pub const METRICS_FILE: &str = "metrics.csv";

/// One CSV row
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetricsRow {
    run_version:  u64,
    epoch:        usize,
    loss:         f64,
    accuracy:     f64,
    val_loss:     f64,
    val_accuracy: f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { csv_path: dir.as_ref().join(METRICS_FILE) }
    }

    /// Append every epoch of `history` under `run_version`.
    /// The header is written only when the file is new.
    pub fn log_history(&self, run_version: u64, history: &TrainingHistory) -> ChurnResult<()> {
        if let Some(parent) = self.csv_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ChurnError::persistence("metrics", e))?;
        }
        let is_new = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| ChurnError::persistence("metrics", e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
        for m in &history.epochs {
            writer
                .serialize(MetricsRow {
                    run_version,
                    epoch:        m.epoch,
                    loss:         m.loss,
                    accuracy:     m.accuracy,
                    val_loss:     m.val_loss,
                    val_accuracy: m.val_accuracy,
                })
                .map_err(|e| ChurnError::persistence("metrics", e))?;
        }
        writer.flush().map_err(|e| ChurnError::persistence("metrics", e))?;

        tracing::debug!(
            "Logged {} epochs for version {} to '{}'",
            history.len(),
            run_version,
            self.csv_path.display(),
        );
        Ok(())
    }

    /// History of the highest run_version in the file, if any run was logged.
    pub fn load_latest_history(&self) -> ChurnResult<Option<(u64, TrainingHistory)>> {
        if !self.csv_path.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .map_err(|e| ChurnError::persistence("metrics", e))?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<MetricsRow>() {
            rows.push(row.map_err(|e| ChurnError::persistence("metrics", e))?);
        }

        let Some(latest) = rows.iter().map(|r| r.run_version).max() else {
            return Ok(None);
        };

        let mut history = TrainingHistory::new();
        for r in rows.into_iter().filter(|r| r.run_version == latest) {
            history.push(EpochMetrics::new(r.epoch, r.loss, r.accuracy, r.val_loss, r.val_accuracy));
        }
        Ok(Some((latest, history)))
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn history(offset: f64) -> TrainingHistory {
        let mut h = TrainingHistory::new();
        h.push(EpochMetrics::new(1, 0.6 + offset, 0.70, 0.65, 0.68));
        h.push(EpochMetrics::new(2, 0.5 + offset, 0.75, 0.55, 0.72));
        h
    }

    #[test]
    fn test_missing_file_has_no_history() {
        let dir = tempdir().unwrap();
        assert!(MetricsLogger::new(dir.path()).load_latest_history().unwrap().is_none());
    }

    #[test]
    fn test_latest_run_is_returned() {
        let dir    = tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path());
        logger.log_history(1, &history(0.0)).unwrap();
        logger.log_history(2, &history(0.1)).unwrap();

        let (version, h) = logger.load_latest_history().unwrap().unwrap();
        assert_eq!(version, 2);
        assert_eq!(h.len(), 2);
        assert!((h.epochs[0].loss - 0.7).abs() < 1e-9);

        // one header line plus four rows
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("run_version,epoch,loss,accuracy,val_loss,val_accuracy"));
    }
}
