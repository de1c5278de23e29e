use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::mpsc::UnboundedSender,
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{trace, warn};

use super::runtime;
use crate::{
    errors::panic_message,
    subscription::{
        disposable::{Disposable, Teardown},
        lock,
    },
};

pub(crate) type Job = Box<dyn FnOnce() + Send>;

pub(crate) enum Command {
    Run(Job),
    Stop,
}

struct WorkerShared {
    kind: &'static str,
    queue: UnboundedSender<Command>,
    disposable: Disposable,
}

impl WorkerShared {
    fn enqueue(&self, job: Job) {
        if self.disposable.is_cancelled() || self.queue.send(Command::Run(job)).is_err() {
            trace!(scheduler = self.kind, "task dropped by a disposed worker");
        }
    }
}

/// Serial execution context handed out by a [`Scheduler`](super::Scheduler).
///
/// Tasks submitted to one worker never overlap and run in submission order, on
/// whatever thread the owning scheduler assigns. Clones share the same queue.
/// Delayed and periodic tasks are timed on the computation runtime and enter the
/// queue once they are due, so a waiting timer never occupies the worker.
#[derive(Clone)]
pub struct Worker {
    shared: Arc<WorkerShared>,
}

impl Worker {
    /// The worker holds the only strong sender of `queue`, so the dispatch loop
    /// ends once the worker is disposed or its last clone is dropped.
    pub(crate) fn new(kind: &'static str, queue: UnboundedSender<Command>) -> Self {
        let disposable = Disposable::new();
        let stop = queue.downgrade();
        disposable.add(Teardown::Logic(Box::new(move || {
            trace!(scheduler = kind, "worker disposed");
            if let Some(stop) = stop.upgrade() {
                let _ = stop.send(Command::Stop);
            }
        })));

        Worker {
            shared: Arc::new(WorkerShared {
                kind,
                queue,
                disposable,
            }),
        }
    }

    /// Runs `task` once, after every task submitted before it.
    pub fn schedule(&self, task: impl FnOnce() + Send + 'static) -> Disposable {
        let task_disposable = Disposable::new();
        self.shared
            .enqueue(self.guarded(&task_disposable, Box::new(task)));
        task_disposable
    }

    /// Runs `task` once `delay` has elapsed.
    ///
    /// A pending timer keeps the worker alive, even when every `Worker` handle
    /// was dropped.
    pub fn schedule_after(
        &self,
        delay: Duration,
        task: impl FnOnce() + Send + 'static,
    ) -> Disposable {
        let task_disposable = Disposable::new();
        let job = self.guarded(&task_disposable, Box::new(task));
        let shared = Arc::clone(&self.shared);

        let timer = runtime::computation().spawn(async move {
            sleep(delay).await;
            shared.enqueue(job);
        });
        task_disposable.add(Teardown::Abort(timer.abort_handle()));
        task_disposable
    }

    /// Runs `task` after `initial` and then every `period` until the returned
    /// handle or the worker is disposed.
    ///
    /// A late tick delays the following ones instead of firing in a burst.
    pub fn schedule_periodically(
        &self,
        initial: Duration,
        period: Duration,
        task: impl FnMut() + Send + 'static,
    ) -> Disposable {
        let task_disposable = Disposable::new();
        let task = Arc::new(Mutex::new(task));
        let shared = Arc::clone(&self.shared);
        let period = period.max(Duration::from_nanos(1));
        let ticks = task_disposable.clone();

        let timer = runtime::computation().spawn(async move {
            let mut interval = interval_at(Instant::now() + initial, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.is_cancelled() || shared.disposable.is_cancelled() {
                    break;
                }
                let task = Arc::clone(&task);
                let job = guard(
                    &ticks,
                    &shared.disposable,
                    Box::new(move || {
                        let mut task = lock(&task);
                        (*task)();
                    }),
                );
                shared.enqueue(job);
            }
        });
        task_disposable.add(Teardown::Abort(timer.abort_handle()));
        task_disposable
    }

    /// Stops the worker. Queued and future tasks are discarded.
    pub fn dispose(&self) {
        self.shared.disposable.cancel();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposable.is_cancelled()
    }

    /// Handle disposing the worker, suitable for linking into a subscription.
    #[must_use]
    pub fn disposable(&self) -> Disposable {
        self.shared.disposable.clone()
    }

    fn guarded(&self, task_disposable: &Disposable, task: Job) -> Job {
        guard(task_disposable, &self.shared.disposable, task)
    }
}

fn guard(task_disposable: &Disposable, worker: &Disposable, task: Job) -> Job {
    let task_disposable = task_disposable.clone();
    let worker = worker.clone();
    Box::new(move || {
        if task_disposable.is_cancelled() || worker.is_cancelled() {
            return;
        }
        task();
    })
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("scheduler", &self.shared.kind)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Runs one task, containing a panic to the task itself.
pub(crate) fn run_guarded(kind: &'static str, job: Job) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
        warn!(
            scheduler = kind,
            panic = %panic_message(payload.as_ref()),
            "scheduled task panicked, worker keeps running"
        );
    }
}
