use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tracing::debug;

use super::Observable;
use crate::{
    errors::SourceError,
    observer::Observer,
    schedulers::Scheduler,
    subscription::{
        lock,
        subscribe::{Subscribeable, Subscriber, Teardown},
    },
};

type Slot<T> = Arc<Mutex<Option<Subscriber<T>>>>;

/// Passes events on until the timer empties the slot.
struct TakeForObserver<T> {
    downstream: Slot<T>,
}

impl<T> Observer for TakeForObserver<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        if let Some(d) = lock(&self.downstream).as_mut() {
            d.next(v);
        }
    }

    fn error(&mut self, err: SourceError) {
        let downstream = lock(&self.downstream).take();
        if let Some(mut d) = downstream {
            d.error(err);
        }
    }

    fn complete(&mut self) {
        let downstream = lock(&self.downstream).take();
        if let Some(mut d) = downstream {
            d.complete();
        }
    }

    fn is_cancelled(&self) -> bool {
        lock(&self.downstream).is_none()
    }
}

pub(super) fn take_for<O, S>(source: O, duration: Duration, scheduler: S) -> Observable<O::Item>
where
    O: Subscribeable + Send + Sync + 'static,
    O::Item: 'static,
    S: Scheduler + 'static,
{
    Observable::new(move |o| {
        let token = o.disposable();
        let upstream = token.child();
        let slot: Slot<O::Item> = Arc::new(Mutex::new(Some(o)));

        let worker = scheduler.create_worker();
        token.add(Teardown::Wrapped(worker.disposable()));

        let timer_slot = Arc::clone(&slot);
        let timer_upstream = upstream.clone();
        let timer = worker.schedule_after(duration, move || {
            let downstream = lock(&timer_slot).take();
            if let Some(mut d) = downstream {
                debug!(?duration, "time window elapsed, completing");
                d.complete();
            }
            timer_upstream.cancel();
        });
        token.add(Teardown::Wrapped(timer));

        source.subscribe(Subscriber::chained(
            &upstream,
            TakeForObserver { downstream: slot },
        ));
        token
    })
}
