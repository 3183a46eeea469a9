//! Handle to a spawned benchmark run.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use framepulse_core::prelude::*;
use framepulse_core::RunOutcome;

/// Cloneable stop switch for a running benchmark.
#[derive(Debug, Clone)]
pub struct BenchmarkCanceller {
    // Arc because watch::Sender does not impl Clone.
    tx: Arc<watch::Sender<bool>>,
}

impl BenchmarkCanceller {
    /// Request that the run stop. Idempotent; a no-op after the run ended.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Owner's handle to a benchmark running on its own tokio task.
#[derive(Debug)]
pub struct BenchmarkHandle {
    canceller: BenchmarkCanceller,
    task: JoinHandle<Result<RunOutcome>>,
}

impl BenchmarkHandle {
    pub(super) fn new(cancel_tx: watch::Sender<bool>, task: JoinHandle<Result<RunOutcome>>) -> Self {
        Self {
            canceller: BenchmarkCanceller {
                tx: Arc::new(cancel_tx),
            },
            task,
        }
    }

    /// Request that the run stop before its deadline.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// A stop switch that can be moved to another task (e.g. a Ctrl-C watcher).
    pub fn canceller(&self) -> BenchmarkCanceller {
        self.canceller.clone()
    }

    /// Whether the run task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    pub async fn join(self) -> Result<RunOutcome> {
        self.task
            .await
            .map_err(|e| Error::task_join(e.to_string()))?
    }
}
