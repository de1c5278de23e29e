use std::sync::Arc;

use tracing::debug;

use super::Observable;
use crate::{
    errors::SourceError,
    observer::Observer,
    subscription::subscribe::{Disposable, Subscribeable, Subscriber},
};

struct ErrorReturnObserver<T, F> {
    downstream: Subscriber<T>,
    f: Arc<F>,
}

impl<T, F: Fn(SourceError) -> T> Observer for ErrorReturnObserver<T, F> {
    type Item = T;

    fn next(&mut self, v: T) {
        self.downstream.next(v);
    }

    fn error(&mut self, err: SourceError) {
        debug!(error = %err, "replacing error with a fallback value");
        let fallback = (self.f)(err);
        self.downstream.next(fallback);
        self.downstream.complete();
    }

    fn complete(&mut self) {
        self.downstream.complete();
    }

    fn is_cancelled(&self) -> bool {
        self.downstream.is_cancelled()
    }
}

pub(super) fn on_error_return<O, F>(source: O, f: F) -> Observable<O::Item>
where
    O: Subscribeable + Send + Sync + 'static,
    O::Item: 'static,
    F: Fn(SourceError) -> O::Item + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Observable::new(move |o| {
        let token = o.disposable();
        let observer = ErrorReturnObserver {
            downstream: o,
            f: Arc::clone(&f),
        };
        source.subscribe(Subscriber::chained(&token, observer))
    })
}

/// Forwards the primary source and, on its failure, hands the downstream subscriber
/// over to the fallback.
struct ResumeNextObserver<T> {
    downstream: Option<Subscriber<T>>,
    fallback: Observable<T>,
    primary: Disposable,
}

impl<T: 'static> Observer for ResumeNextObserver<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        if let Some(d) = &mut self.downstream {
            d.next(v);
        }
    }

    fn error(&mut self, err: SourceError) {
        if let Some(d) = self.downstream.take() {
            debug!(error = %err, "source failed, resuming with the fallback");
            self.primary.cancel();
            self.fallback.subscribe(d);
        }
    }

    fn complete(&mut self) {
        if let Some(d) = &mut self.downstream {
            d.complete();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.downstream.as_ref().map_or(true, |d| d.is_cancelled())
    }
}

pub(super) fn on_error_resume_next<O>(
    source: O,
    fallback: Observable<O::Item>,
) -> Observable<O::Item>
where
    O: Subscribeable + Send + Sync + 'static,
    O::Item: 'static,
{
    Observable::new(move |o| {
        let token = o.disposable();
        let primary = token.child();
        let observer = ResumeNextObserver {
            downstream: Some(o),
            fallback: fallback.clone(),
            primary: primary.clone(),
        };
        source.subscribe(Subscriber::chained(&primary, observer));
        token
    })
}
