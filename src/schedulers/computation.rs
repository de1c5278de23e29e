use tokio::sync::mpsc::unbounded_channel;

use super::{
    runtime,
    worker::{run_guarded, Command, Worker},
    Scheduler,
};

/// Runs tasks on a fixed pool sized to the CPU count.
///
/// Meant for short, non-blocking work such as timer ticks and event delivery.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComputationScheduler;

impl Scheduler for ComputationScheduler {
    fn create_worker(&self) -> Worker {
        let (tx, mut rx) = unbounded_channel();
        let worker = Worker::new("computation", tx);

        runtime::computation().spawn(async move {
            while let Some(Command::Run(job)) = rx.recv().await {
                run_guarded("computation", job);
            }
        });
        worker
    }
}
