//! Entry points producing new observables.

use std::{
    any::Any,
    error::Error,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
    time::Duration,
};

use tracing::{trace, warn};

use super::Observable;
use crate::{
    errors::{RxError, SourceError},
    observer::Observer,
    schedulers::{self, Scheduler},
    subscription::{
        lock,
        subscribe::{Subscribeable, Subscriber, Teardown},
    },
};

/// Emits `count` consecutive integers starting at `start`, then completes.
///
/// Emission happens synchronously on the subscribing thread. If the last value
/// would not fit in an `i32`, the subscriber receives an
/// [`RxError::InvalidArgument`] error instead.
pub fn range(start: i32, count: usize) -> Observable<i32> {
    Observable::new(move |mut o| {
        let token = o.disposable();
        let first = i64::from(start);
        let Some(end) = i64::try_from(count)
            .ok()
            .and_then(|c| first.checked_add(c))
            .filter(|&end| end - 1 <= i64::from(i32::MAX))
        else {
            o.error(
                RxError::InvalidArgument {
                    name: "count",
                    reason: format!("{} values starting at {} overflow i32", count, start),
                }
                .into_source_error(),
            );
            return token;
        };

        for value in first..end {
            if o.is_cancelled() {
                trace!(value, "range stopped by cancellation");
                return token;
            }
            o.next(value as i32);
        }
        o.complete();
        token
    })
}

/// Emits `0, 1, 2, ...` on the computation scheduler, the first value after
/// `initial` and the following ones every `period`. Never completes on its own.
pub fn interval(initial: Duration, period: Duration) -> Observable<u64> {
    interval_on(initial, period, schedulers::computation())
}

/// Like [`interval`], emitting from a worker of `scheduler`.
pub fn interval_on(
    initial: Duration,
    period: Duration,
    scheduler: impl Scheduler + 'static,
) -> Observable<u64> {
    Observable::new(move |mut o| {
        let token = o.disposable();
        let worker = scheduler.create_worker();
        token.add(Teardown::Wrapped(worker.disposable()));

        let mut tick = 0;
        let task = worker.schedule_periodically(initial, period, move || {
            if o.is_cancelled() {
                return;
            }
            o.next(tick);
            tick += 1;
        });
        token.add(Teardown::Wrapped(task));
        token
    })
}

/// Invokes `supplier` once per subscription and emits its result.
///
/// `Ok(v)` becomes `v` followed by completion, `Err(e)` becomes an error. A panic
/// inside `supplier` is caught and delivered as [`RxError::Panicked`].
pub fn from_callable<T, E, F>(supplier: F) -> Observable<T>
where
    T: 'static,
    E: Error + Send + Sync + 'static,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
{
    Observable::new(move |mut o| {
        let token = o.disposable();
        if o.is_cancelled() {
            return token;
        }
        match catch_unwind(AssertUnwindSafe(&supplier)) {
            Ok(Ok(v)) => {
                o.next(v);
                o.complete();
            }
            Ok(Err(e)) => o.error(Arc::new(e)),
            Err(payload) => {
                o.error(RxError::from_panic("from_callable supplier", payload).into_source_error())
            }
        }
        token
    })
}

/// Forwards the events of a `create` producer to the subscriber kept in a shared
/// slot, so that the subscriber is still reachable if the producer panics.
struct SharedObserver<T> {
    downstream: Arc<Mutex<Subscriber<T>>>,
}

impl<T> Observer for SharedObserver<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        lock(&self.downstream).next(v);
    }

    fn error(&mut self, err: SourceError) {
        lock(&self.downstream).error(err);
    }

    fn complete(&mut self) {
        lock(&self.downstream).complete();
    }

    fn is_cancelled(&self) -> bool {
        lock(&self.downstream).is_cancelled()
    }
}

fn deliver_panic<T>(
    downstream: &Mutex<Subscriber<T>>,
    context: &'static str,
    payload: Box<dyn Any + Send>,
) {
    let err = RxError::from_panic(context, payload);
    let mut d = lock(downstream);
    if d.is_cancelled() {
        warn!(error = %err, "source panicked after its subscriber finished");
        return;
    }
    d.error(err.into_source_error());
}

/// Hands the raw subscriber to `producer` for every subscription.
///
/// `producer` is responsible for the whole protocol: it emits through the
/// subscriber, polls [`Observer::is_cancelled`] to stop early and signals
/// completion or failure itself. A panic inside `producer` is caught and delivered
/// as [`RxError::Panicked`].
pub fn create<T, F>(producer: F) -> Observable<T>
where
    T: 'static,
    F: Fn(Subscriber<T>) + Send + Sync + 'static,
{
    Observable::new(move |o| {
        let token = o.disposable();
        let downstream = Arc::new(Mutex::new(o));
        let inner = Subscriber::chained(
            &token,
            SharedObserver {
                downstream: Arc::clone(&downstream),
            },
        );
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| producer(inner))) {
            deliver_panic(&downstream, "create producer", payload);
        }
        token
    })
}

/// Builds a fresh observable with `factory` for every subscription.
///
/// A panic inside `factory` is delivered as [`RxError::Panicked`].
pub fn defer<T, F>(factory: F) -> Observable<T>
where
    T: 'static,
    F: Fn() -> Observable<T> + Send + Sync + 'static,
{
    Observable::new(move |mut o| match catch_unwind(AssertUnwindSafe(&factory)) {
        Ok(source) => source.subscribe(o),
        Err(payload) => {
            o.error(RxError::from_panic("defer factory", payload).into_source_error());
            o.disposable()
        }
    })
}

/// Emits `value` and completes.
pub fn just<T>(value: T) -> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    Observable::new(move |mut o| {
        o.next(value.clone());
        o.complete();
        o.disposable()
    })
}
