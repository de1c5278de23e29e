//! The `observable` module provides the building blocks for creating and manipulating
//! observables, allowing for reactive programming in Rust.

use std::{sync::Arc, time::Duration};

use crate::{
    errors::SourceError,
    observer::Observer,
    schedulers::{self, Scheduler},
    subscription::subscribe::{Disposable, Subscribeable, Subscriber, Teardown},
};

mod factories;
pub mod multicast;
mod recovery;
mod thread_hop;
mod timed;

pub use factories::{create, defer, from_callable, interval, interval_on, just, range};
pub use multicast::ConnectableObservable;

/// The `Observable` struct represents a source of values that can be observed
/// and transformed.
///
/// An `Observable` is an immutable recipe: nothing runs until it is subscribed, and
/// every `subscribe` call starts a fresh, independent execution. Clones share the
/// same recipe.
///
/// # Example: basic synchronous `Observable`
///
/// This simple `Observable` emits values and completes on the subscribing thread.
///
/// ```no_run
/// use rxflow::{Observable, Observer, Subscribeable, Subscriber};
///
/// // Create a custom observable that emits values from 1 to 10.
/// let emit_10_observable = Observable::new(|mut subscriber| {
///     let token = subscriber.disposable();
///
///     for i in 1..=10 {
///         // Stop as soon as the consumer is no longer interested.
///         if subscriber.is_cancelled() {
///             return token;
///         }
///         subscriber.next(i);
///     }
///     subscriber.complete();
///     token
/// });
///
/// let observer = Subscriber::new(
///     |v| println!("Emitted {}", v),
///     |e| eprintln!("Failed: {}", e),
///     || println!("Completed"),
/// );
///
/// // Observables are cold. Without this call nothing is emitted.
/// emit_10_observable.subscribe(observer);
/// ```
///
/// # Example: asynchronous `Observable`
///
/// Production is moved to a dedicated thread with `subscribe_on`, delivery to
/// another one with `observe_on`. The returned `Disposable` stops both.
///
/// ```no_run
/// use std::time::Duration;
///
/// use rxflow::{range, schedulers, ObservableExt, Subscribeable, Subscriber};
///
/// let subscription = range(1, 1_000)
///     .subscribe_on(schedulers::io())
///     .map(|v| v * 2)
///     .observe_on(schedulers::new_thread())
///     .subscribe(Subscriber::on_next(|v| println!("Emitted {}", v)));
///
/// std::thread::sleep(Duration::from_millis(10));
/// subscription.cancel();
/// ```
///
/// # Example: `Observable` with error handling
///
/// Errors travel as a [`SourceError`], an `Arc` around any error type.
///
///```no_run
/// use std::{error::Error, fmt::Display, sync::Arc};
///
/// use rxflow::{Observable, Observer, Subscribeable, Subscriber};
///
/// #[derive(Debug)]
/// struct MyErr(i32);
///
/// impl Display for MyErr {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "number should be less than 100, got {}", self.0)
///     }
/// }
///
/// impl Error for MyErr {}
///
/// pub fn less_than_100(input: i32) -> Observable<i32> {
///     Observable::new(move |mut observer| {
///         if input >= 100 {
///             observer.error(Arc::new(MyErr(input)));
///         } else {
///             observer.next(input);
///             observer.complete();
///         }
///         observer.disposable()
///     })
/// }
///
/// less_than_100(512).subscribe(Subscriber::new(
///     |v| println!("Got: {}", v),
///     |e| eprintln!("{}", e),
///     || println!("Input handled"),
/// ));
///```
pub struct Observable<T> {
    subscribe_fn: Arc<dyn Fn(Subscriber<T>) -> Disposable + Send + Sync>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// `sf` runs once per subscription and drives the given `Subscriber`. It returns
    /// the `Disposable` cancelling whatever it started; returning
    /// `subscriber.disposable()` is enough when the work is bound to the
    /// subscriber's own token. Producers should poll `is_cancelled` between
    /// emissions.
    pub fn new(sf: impl Fn(Subscriber<T>) -> Disposable + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Arc::new(sf),
        }
    }

    /// Creates an `Observable` that immediately signals `err` to every subscriber.
    pub fn error(err: SourceError) -> Self {
        Observable::new(move |mut o| {
            o.error(Arc::clone(&err));
            o.disposable()
        })
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type Item = T;

    fn subscribe(&self, mut s: Subscriber<T>) -> Disposable {
        let token = s.disposable();
        s.activate();
        let inner = (self.subscribe_fn)(s);
        token.add(Teardown::Wrapped(inner));
        token
    }
}

struct MapObserver<T, U, F> {
    downstream: Subscriber<U>,
    f: Arc<F>,
    _item: std::marker::PhantomData<fn(T)>,
}

impl<T, U, F: Fn(T) -> U> Observer for MapObserver<T, U, F> {
    type Item = T;

    fn next(&mut self, v: T) {
        let mapped = (self.f)(v);
        self.downstream.next(mapped);
    }

    fn error(&mut self, err: SourceError) {
        self.downstream.error(err);
    }

    fn complete(&mut self) {
        self.downstream.complete();
    }

    fn is_cancelled(&self) -> bool {
        self.downstream.is_cancelled()
    }
}

struct TapObserver<T, F> {
    downstream: Subscriber<T>,
    f: Arc<F>,
}

impl<T, F: Fn(&T)> Observer for TapObserver<T, F> {
    type Item = T;

    fn next(&mut self, v: T) {
        (self.f)(&v);
        self.downstream.next(v);
    }

    fn error(&mut self, err: SourceError) {
        self.downstream.error(err);
    }

    fn complete(&mut self) {
        self.downstream.complete();
    }

    fn is_cancelled(&self) -> bool {
        self.downstream.is_cancelled()
    }
}

/// The `ObservableExt` trait provides a set of extension methods that can be applied
/// to observables to transform and manipulate their behavior.
///
/// Every operator returns a new `Observable` recipe and leaves `self` untouched, so
/// the same pipeline can be subscribed any number of times.
pub trait ObservableExt<T: 'static>: Subscribeable<Item = T> {
    /// Transforms the items emitted by the observable using a transformation
    /// function.
    ///
    /// The transformation function `f` is applied to each item emitted by the
    /// observable, and the resulting value is emitted by the resulting observable.
    fn map<U, F>(self, f: F) -> Observable<U>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
        U: 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let token = o.disposable();
            let u = Subscriber::chained(
                &token,
                MapObserver {
                    downstream: o,
                    f: Arc::clone(&f),
                    _item: std::marker::PhantomData,
                },
            );
            self.subscribe(u)
        })
    }

    /// Invokes `f` with a reference to every item before passing it on unchanged.
    fn do_on_next<F>(self, f: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o| {
            let token = o.disposable();
            let u = Subscriber::chained(
                &token,
                TapObserver {
                    downstream: o,
                    f: Arc::clone(&f),
                },
            );
            self.subscribe(u)
        })
    }

    /// Performs the subscription, and therefore any synchronous production of the
    /// source, on a worker of `scheduler`.
    ///
    /// `subscribe` returns right away. Cancelling the returned `Disposable` before
    /// the worker got to it skips the subscription altogether.
    fn subscribe_on<S>(self, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        S: Scheduler + 'static,
    {
        thread_hop::subscribe_on(self, scheduler)
    }

    /// Delivers every event to the downstream subscriber on a single worker of
    /// `scheduler`, in the order the events were produced.
    fn observe_on<S>(self, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        S: Scheduler + 'static,
        T: Send,
    {
        thread_hop::observe_on(self, scheduler)
    }

    /// Replaces an error with the value computed by `f`, followed by completion.
    fn on_error_return<F>(self, f: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(SourceError) -> T + Send + Sync + 'static,
    {
        recovery::on_error_return(self, f)
    }

    /// Continues with `fallback` when the source fails.
    ///
    /// The error is swallowed and the same downstream subscriber is subscribed to
    /// `fallback`, whose events and terminal event it then receives.
    fn on_error_resume_next(self, fallback: Observable<T>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        recovery::on_error_resume_next(self, fallback)
    }

    /// Mirrors the source for `duration`, then completes and cancels the source.
    ///
    /// The timer runs on the computation scheduler.
    fn take_for(self, duration: Duration) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        timed::take_for(self, duration, schedulers::computation())
    }

    /// Like [`take_for`](ObservableExt::take_for), timing on a worker of `scheduler`.
    fn take_for_on<S>(self, duration: Duration, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        S: Scheduler + 'static,
    {
        timed::take_for(self, duration, scheduler)
    }

    /// Shares a single subscription to this observable among many subscribers.
    ///
    /// Nothing is subscribed until [`ConnectableObservable::connect`] is called.
    fn publish(self) -> ConnectableObservable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Clone + Send,
    {
        ConnectableObservable::new(Arc::new(self))
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<Item = T> {}
