// ============================================================
// Layer 2 - ReportUseCase
// ============================================================
// Builds the charts `report` prints: the two illustrative
// placeholder charts, then the accuracy/loss charts of the most
// recent logged run when there is one.

use anyhow::Result;

use crate::domain::history::TrainingHistory;
use crate::infra::{
    artifact_store::ArtifactStore,
    charts::{history_charts, placeholder_charts, LineChart},
    metrics::MetricsLogger,
};

pub struct Report {
    pub placeholders: Vec<LineChart>,
    /// Version and charts of the latest logged run
    pub latest:       Option<(u64, Vec<LineChart>)>,
}

impl Report {
    /// Report for a run that just finished, without reading the log back
    pub fn for_history(version: u64, history: &TrainingHistory) -> Self {
        Self {
            placeholders: placeholder_charts(),
            latest:       Some((version, history_charts(history))),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for chart in &self.placeholders {
            out.push_str(&chart.render());
            out.push('\n');
        }
        match &self.latest {
            Some((version, charts)) => {
                out.push_str(&format!("Artifacts version {version}\n\n"));
                for chart in charts {
                    out.push_str(&chart.render());
                    out.push('\n');
                }
            }
            None => out.push_str("No training run has been logged yet. Run 'retrain' first.\n"),
        }
        out
    }
}

pub struct ReportUseCase<'a> {
    store: &'a ArtifactStore,
}

impl<'a> ReportUseCase<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<Report> {
        let latest = MetricsLogger::new(self.store.dir())
            .load_latest_history()?
            .map(|(version, history)| (version, history_charts(&history)));
        if latest.is_none() {
            tracing::debug!("No metrics logged in '{}'", self.store.dir().display());
        }
        Ok(Report { placeholders: placeholder_charts(), latest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::EpochMetrics;
    use tempfile::tempdir;

    #[test]
    fn test_report_without_runs_shows_placeholders_only() {
        let dir    = tempdir().unwrap();
        let store  = ArtifactStore::new(dir.path());
        let report = ReportUseCase::new(&store).execute().unwrap();
        assert_eq!(report.placeholders.len(), 2);
        assert!(report.latest.is_none());
        assert!(report.render().contains("Run 'retrain' first"));
    }

    #[test]
    fn test_report_reads_latest_run() {
        let dir = tempdir().unwrap();
        let mut h = TrainingHistory::new();
        h.push(EpochMetrics::new(1, 0.6, 0.7, 0.62, 0.69));
        h.push(EpochMetrics::new(2, 0.5, 0.8, 0.55, 0.75));
        MetricsLogger::new(dir.path()).log_history(4, &h).unwrap();

        let store  = ArtifactStore::new(dir.path());
        let report = ReportUseCase::new(&store).execute().unwrap();
        let (version, charts) = report.latest.as_ref().unwrap();
        assert_eq!(*version, 4);
        assert_eq!(charts[0].title, "Model Accuracy");

        let text = report.render();
        assert!(text.contains("Training and Testing Loss"));
        assert!(text.contains("Model Loss"));
    }
}
