use std::fmt;

use tracing::error;

use crate::{errors::SourceError, observer::Observer};

pub use super::disposable::{Disposable, Teardown};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type Item;

    /// Starts delivering events to `s` and returns the handle cancelling them.
    ///
    /// The returned `Disposable` is the subscriber's own cancellation token, so
    /// cancelling it stops the whole chain feeding this subscriber.
    fn subscribe(&self, s: Subscriber<Self::Item>) -> Disposable;
}

/// Lifecycle of one subscription as seen by its [`Subscriber`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created but not yet handed to a source.
    Idle,
    /// Receiving events.
    Active,
    /// `complete` was delivered.
    Completed,
    /// `error` was delivered.
    Errored,
    /// The consumer cancelled before a terminal event arrived.
    Cancelled,
}

impl SubscriptionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(SourceError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

struct FnObserver<T> {
    next_fn: NextFn<T>,
    error_fn: Option<ErrorFn>,
    complete_fn: Option<CompleteFn>,
}

impl<T> Observer for FnObserver<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        (self.next_fn)(v);
    }

    fn error(&mut self, err: SourceError) {
        match &mut self.error_fn {
            Some(efn) => efn(err),
            None => error!(error = %err, "error delivered to a subscriber without an error handler"),
        }
    }

    fn complete(&mut self) {
        if let Some(cfn) = &mut self.complete_fn {
            cfn();
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Admission {
    Deliver,
    Dropped,
    Violation,
}

/// Runtime guard for one subscription.
///
/// Wraps an [`Observer`] and enforces the event protocol: nothing is delivered after
/// a terminal event or after the subscription's [`Disposable`] was cancelled.
/// Events arriving after cancellation are dropped silently. Events arriving after a
/// terminal event are a defect of the producing source; they are dropped, logged and
/// counted (see [`Subscriber::violations`]).
///
/// Users create a `Subscriber` with [`new`](Subscriber::new),
/// [`on_next`](Subscriber::on_next) or [`from_observer`](Subscriber::from_observer).
/// Such subscribers own a fresh cancellation token and cancel it right after their
/// terminal event, which releases every resource the upstream chain registered on it.
pub struct Subscriber<T> {
    observer: Box<dyn Observer<Item = T> + Send>,
    state: SubscriptionState,
    token: Disposable,
    release_on_terminal: bool,
    violations: usize,
}

impl<T: 'static> Subscriber<T> {
    /// Creates a new `Subscriber` with custom handling functions for emitted
    /// values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(T) + Send + 'static,
        error_fn: impl FnMut(SourceError) + Send + 'static,
        complete_fn: impl FnMut() + Send + 'static,
    ) -> Self {
        Subscriber::from_observer(FnObserver {
            next_fn: Box::new(next_fn),
            error_fn: Some(Box::new(error_fn)),
            complete_fn: Some(Box::new(complete_fn)),
        })
    }

    /// Create a new Subscriber with only the `next` function.
    ///
    /// Errors reaching this subscriber are logged at `error` level.
    pub fn on_next(next_fn: impl FnMut(T) + Send + 'static) -> Self {
        Subscriber::from_observer(FnObserver {
            next_fn: Box::new(next_fn),
            error_fn: None,
            complete_fn: None,
        })
    }

    /// Wraps any observer implementation into a user-facing subscriber.
    pub fn from_observer(observer: impl Observer<Item = T> + Send + 'static) -> Self {
        Subscriber {
            observer: Box::new(observer),
            state: SubscriptionState::Idle,
            token: Disposable::new(),
            release_on_terminal: true,
            violations: 0,
        }
    }
}

impl<T> Subscriber<T> {
    /// Creates an intermediate stage subscriber sharing `token` with the rest of its
    /// chain. It never cancels the token on its own.
    pub(crate) fn chained(
        token: &Disposable,
        observer: impl Observer<Item = T> + Send + 'static,
    ) -> Self {
        Subscriber {
            observer: Box::new(observer),
            state: SubscriptionState::Idle,
            token: token.clone(),
            release_on_terminal: false,
            violations: 0,
        }
    }

    /// The cancellation token of this subscription.
    #[must_use]
    pub fn disposable(&self) -> Disposable {
        self.token.clone()
    }

    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Number of events a misbehaving source pushed after the terminal event.
    #[must_use]
    pub fn violations(&self) -> usize {
        self.violations
    }

    pub(crate) fn activate(&mut self) {
        if self.state == SubscriptionState::Idle {
            self.state = SubscriptionState::Active;
        }
    }

    fn admit(&mut self, event: &'static str) -> Admission {
        match self.state {
            SubscriptionState::Completed | SubscriptionState::Errored => {
                self.violations += 1;
                error!(
                    event,
                    state = ?self.state,
                    "protocol violation: event emitted after the terminal event, dropped"
                );
                Admission::Violation
            }
            SubscriptionState::Cancelled => Admission::Dropped,
            SubscriptionState::Idle | SubscriptionState::Active => {
                if self.token.is_cancelled() {
                    self.state = SubscriptionState::Cancelled;
                    return Admission::Dropped;
                }
                self.state = SubscriptionState::Active;
                Admission::Deliver
            }
        }
    }

    fn release(&self) {
        if self.release_on_terminal {
            self.token.cancel();
        }
    }
}

impl<T> Observer for Subscriber<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        if self.admit("next") == Admission::Deliver {
            self.observer.next(v);
        }
    }

    fn error(&mut self, err: SourceError) {
        if self.admit("error") == Admission::Deliver {
            self.state = SubscriptionState::Errored;
            self.observer.error(err);
            self.release();
        }
    }

    fn complete(&mut self) {
        if self.admit("complete") == Admission::Deliver {
            self.state = SubscriptionState::Completed;
            self.observer.complete();
            self.release();
        }
    }

    /// Also `true` once a terminal event went through or the wrapped observer
    /// reports itself cancelled.
    fn is_cancelled(&self) -> bool {
        !matches!(self.state, SubscriptionState::Idle | SubscriptionState::Active)
            || self.token.is_cancelled()
            || self.observer.is_cancelled()
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("state", &self.state)
            .field("token", &self.token)
            .field("violations", &self.violations)
            .finish_non_exhaustive()
    }
}
