// ============================================================
// Layer 2 - Background Retraining Job
// ============================================================
// Runs a RetrainUseCase on its own thread so the caller can watch
// progress and cancel:
//
//   let job = RetrainJob::spawn(use_case, request);
//   for event in job.events() { ... }   // ends when the worker exits
//   let outcome = job.join()?;
//
// `canceller()` hands out a sender-less control so a signal handler
// can stop the run without owning the job.

use std::{
    sync::{
        atomic::AtomicBool,
        mpsc::{self, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Result};

use crate::application::retrain_use_case::{RetrainOutcome, RetrainRequest, RetrainUseCase};
use crate::domain::progress::{TrainingControl, TrainingEvent};

pub struct RetrainJob {
    control: TrainingControl,
    events:  Receiver<TrainingEvent>,
    handle:  JoinHandle<Result<RetrainOutcome>>,
}

impl RetrainJob {
    pub fn spawn(use_case: RetrainUseCase, request: RetrainRequest) -> Self {
        let (tx, rx) = mpsc::channel();
        let control  = TrainingControl::new(Arc::new(AtomicBool::new(false)), Some(tx));

        let worker_control = control.clone();
        let handle = thread::spawn(move || {
            let result = use_case.execute(&request, &worker_control);
            // Dropping the sender ends the caller's event iterator
            drop(worker_control);
            result
        });

        // The job keeps a control without a sender, only for cancel()
        let control = TrainingControl::new(control.cancel_flag(), None);
        Self { control, events: rx, handle }
    }

    /// Ask the worker to stop before its next batch
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// A handle that cancels this job from another thread, such as a
    /// Ctrl-C handler
    pub fn canceller(&self) -> TrainingControl {
        self.control.clone()
    }

    /// Blocking iterator over progress events
    pub fn events(&self) -> impl Iterator<Item = TrainingEvent> + '_ {
        self.events.iter()
    }

    pub fn join(self) -> Result<RetrainOutcome> {
        self.handle
            .join()
            .map_err(|_| anyhow!("Retraining worker panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::retrain_use_case::tests::{quick_request, use_case};
    use crate::domain::error::ChurnError;
    use tempfile::tempdir;

    #[test]
    fn test_events_arrive_in_order() {
        let dir = tempdir().unwrap();
        let job = RetrainJob::spawn(use_case(dir.path()), quick_request());

        let events: Vec<TrainingEvent> = job.events().collect();
        let outcome = job.join().unwrap();

        assert!(matches!(events.first(), Some(TrainingEvent::Started { epochs: 10, .. })));
        let epochs = events
            .iter()
            .filter(|e| matches!(e, TrainingEvent::EpochFinished(_)))
            .count();
        assert_eq!(epochs, 10);
        assert_eq!(events.last(), Some(&TrainingEvent::Saved { version: outcome.manifest.version }));
    }

    #[test]
    fn test_cancel_stops_the_worker() {
        let dir = tempdir().unwrap();
        let mut request = quick_request();
        request.hyperparameters.epochs = 100;
        let job = RetrainJob::spawn(use_case(dir.path()), request);

        for event in job.events() {
            if matches!(event, TrainingEvent::EpochFinished(_)) {
                job.cancel();
            }
        }
        let err = job.join().unwrap_err();
        assert!(matches!(err.downcast_ref::<ChurnError>(), Some(ChurnError::Cancelled)));
        assert!(!dir.path().join("manifest.json").exists());
    }

    #[test]
    fn test_canceller_from_another_thread() {
        let dir = tempdir().unwrap();
        let mut request = quick_request();
        request.hyperparameters.epochs = 100;
        let job       = RetrainJob::spawn(use_case(dir.path()), request);
        let canceller = job.canceller();

        let mut first_epoch = true;
        for event in job.events() {
            if first_epoch && matches!(event, TrainingEvent::EpochFinished(_)) {
                first_epoch = false;
                let c = canceller.clone();
                thread::spawn(move || c.cancel()).join().unwrap();
            }
        }
        let err = job.join().unwrap_err();
        assert!(matches!(err.downcast_ref::<ChurnError>(), Some(ChurnError::Cancelled)));
        assert!(!dir.path().join(".lock").exists());
        assert!(!dir.path().join("manifest.json").exists());
    }
}
