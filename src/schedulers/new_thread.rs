use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, error};

use super::{
    runtime,
    worker::{run_guarded, Command, Worker},
    Scheduler,
};

static THREAD_ID: AtomicUsize = AtomicUsize::new(0);

/// Gives every worker its own dedicated OS thread.
///
/// The thread lives as long as the worker and exits once the worker is disposed
/// or no longer referenced.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewThreadScheduler;

impl Scheduler for NewThreadScheduler {
    fn create_worker(&self) -> Worker {
        let (tx, mut rx) = unbounded_channel();
        let worker = Worker::new("new-thread", tx);
        let name = runtime::thread_name("newthread", THREAD_ID.fetch_add(1, Ordering::Relaxed));

        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(Command::Run(job)) = rx.blocking_recv() {
                run_guarded("new-thread", job);
            }
        });
        match spawned {
            Ok(_) => debug!(thread = %name, "new-thread worker started"),
            Err(err) => {
                error!(thread = %name, error = %err, "failed to spawn a worker thread");
                worker.dispose();
            }
        }
        worker
    }
}
