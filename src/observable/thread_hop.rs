use std::sync::{Arc, Mutex};

use tracing::debug;

use super::Observable;
use crate::{
    errors::SourceError,
    observer::Observer,
    schedulers::{Scheduler, Worker},
    subscription::{
        lock,
        subscribe::{Subscribeable, Subscriber, Teardown},
    },
};

pub(super) fn subscribe_on<O, S>(source: O, scheduler: S) -> Observable<O::Item>
where
    O: Subscribeable + Send + Sync + 'static,
    O::Item: 'static,
    S: Scheduler + 'static,
{
    let source = Arc::new(source);
    Observable::new(move |o| {
        let token = o.disposable();
        let worker = scheduler.create_worker();
        token.add(Teardown::Wrapped(worker.disposable()));

        let source = Arc::clone(&source);
        debug!(?worker, "moving subscription to a worker");
        let task = worker.schedule(move || {
            source.subscribe(o);
        });
        token.add(Teardown::Wrapped(task));
        token
    })
}

/// Hands every event to `worker` so that delivery happens on its thread, one event
/// at a time and in arrival order.
struct ObserveOnObserver<T> {
    worker: Worker,
    downstream: Arc<Mutex<Subscriber<T>>>,
}

impl<T: Send + 'static> ObserveOnObserver<T> {
    fn dispatch(&self, deliver: impl FnOnce(&mut Subscriber<T>) + Send + 'static) {
        let downstream = Arc::clone(&self.downstream);
        self.worker.schedule(move || deliver(&mut *lock(&downstream)));
    }
}

impl<T: Send + 'static> Observer for ObserveOnObserver<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        self.dispatch(move |d| d.next(v));
    }

    fn error(&mut self, err: SourceError) {
        self.dispatch(move |d| d.error(err));
    }

    fn complete(&mut self) {
        self.dispatch(|d| d.complete());
    }

    fn is_cancelled(&self) -> bool {
        self.worker.is_disposed()
    }
}

pub(super) fn observe_on<O, S>(source: O, scheduler: S) -> Observable<O::Item>
where
    O: Subscribeable + Send + Sync + 'static,
    O::Item: Send + 'static,
    S: Scheduler + 'static,
{
    Observable::new(move |o| {
        let token = o.disposable();
        let worker = scheduler.create_worker();
        token.add(Teardown::Wrapped(worker.disposable()));

        let observer = ObserveOnObserver {
            worker,
            downstream: Arc::new(Mutex::new(o)),
        };
        source.subscribe(Subscriber::chained(&token, observer))
    })
}
