use tokio::{sync::mpsc::unbounded_channel, task};
use tracing::warn;

use super::{
    runtime,
    worker::{run_guarded, Command, Worker},
    Scheduler,
};

/// Runs tasks on an elastic pool of threads suited to blocking work.
///
/// Threads are created on demand, reused across workers and released after
/// staying idle for the configured keep-alive. Each worker still executes its own
/// tasks one at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct IoScheduler;

impl Scheduler for IoScheduler {
    fn create_worker(&self) -> Worker {
        let (tx, mut rx) = unbounded_channel();
        let worker = Worker::new("io", tx);

        runtime::io().spawn(async move {
            while let Some(Command::Run(job)) = rx.recv().await {
                if let Err(err) = task::spawn_blocking(move || run_guarded("io", job)).await {
                    warn!(error = %err, "io task did not run to completion");
                }
            }
        });
        worker
    }
}
