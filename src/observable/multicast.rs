//! Module for handling observables with multicast capabilities.
//!
//! This module provides [`ConnectableObservable`], which shares one subscription to
//! an underlying source among every registered subscriber. Subscribers register
//! first; the source only starts when [`ConnectableObservable::connect`] is called,
//! either directly or through [`ConnectableObservable::auto_connect`].
//!
//! One upstream run, from `connect` to its terminal event, is a *generation*. A
//! terminal event closes the generation and the next `connect` starts the source
//! again from scratch. Late events of a closed generation are discarded.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use tracing::debug;

use super::Observable;
use crate::{
    errors::SourceError,
    observer::Observer,
    subscription::{
        lock,
        subscribe::{Disposable, Subscribeable, Subscriber, Teardown},
    },
};

type Shared<T> = Arc<Mutex<Subscriber<T>>>;

struct Entry<T> {
    key: u64,
    token: Disposable,
    subscriber: Shared<T>,
}

struct HubState<T> {
    registry: Vec<Entry<T>>,
    next_key: u64,
    generation: u64,
    connection: Option<Disposable>,
}

impl<T> HubState<T> {
    fn live_connection(&self) -> Option<&Disposable> {
        self.connection.as_ref().filter(|c| !c.is_cancelled())
    }

    fn snapshot(&self) -> Vec<Shared<T>> {
        self.registry
            .iter()
            .filter(|e| !e.token.is_cancelled())
            .map(|e| Arc::clone(&e.subscriber))
            .collect()
    }
}

struct Hub<T> {
    source: Arc<dyn Subscribeable<Item = T> + Send + Sync>,
    state: Mutex<HubState<T>>,
}

impl<T> Hub<T> {
    fn deregister(&self, key: u64) {
        lock(&self.state).registry.retain(|e| e.key != key);
    }

    /// Ends `generation` if it is still the current one. Returns the subscribers
    /// to notify, or `None` when the generation was already closed.
    fn close_generation(
        &self,
        generation: u64,
    ) -> Option<(Vec<Shared<T>>, Option<Disposable>)> {
        let mut state = lock(&self.state);
        if state.generation != generation {
            return None;
        }
        state.generation += 1;
        let connection = state.connection.take();
        debug!(generation, "multicast generation closed");
        Some((state.snapshot(), connection))
    }

    /// Subscribers of `generation`, or `None` if it is no longer current.
    fn targets(&self, generation: u64) -> Option<Vec<Shared<T>>> {
        let state = lock(&self.state);
        (state.generation == generation).then(|| state.snapshot())
    }
}

/// Upstream subscriber of one generation, fanning events out to the registry.
struct Relay<T> {
    hub: Arc<Hub<T>>,
    generation: u64,
}

impl<T> Relay<T> {
    fn terminate(&self, deliver: impl Fn(&mut Subscriber<T>)) {
        let Some((targets, connection)) = self.hub.close_generation(self.generation) else {
            return;
        };
        for target in targets {
            let mut s = lock(&target);
            if !s.is_cancelled() {
                deliver(&mut *s);
            }
        }
        if let Some(connection) = connection {
            connection.cancel();
        }
    }
}

impl<T: Clone> Observer for Relay<T> {
    type Item = T;

    fn next(&mut self, v: T) {
        let Some(targets) = self.hub.targets(self.generation) else {
            return;
        };
        for target in targets {
            let mut s = lock(&target);
            if !s.is_cancelled() {
                s.next(v.clone());
            }
        }
    }

    fn error(&mut self, err: SourceError) {
        self.terminate(|s| s.error(Arc::clone(&err)));
    }

    fn complete(&mut self) {
        self.terminate(|s| s.complete());
    }

    fn is_cancelled(&self) -> bool {
        lock(&self.hub.state).generation != self.generation
    }
}

/// Multicasting observable with a `connect()` method for creating subscriptions to
/// an underlying source, enabling multiple consumers to connect and receive emitted
/// values concurrently.
///
/// Subscribing only registers the subscriber; it receives nothing until the
/// observable is connected. Once connected, every event of the source is delivered
/// to every registered subscriber in registration order. There is no replay:
/// subscribers registering later only see what is emitted from then on.
///
/// Clones share the same registry and connection.
pub struct ConnectableObservable<T> {
    hub: Arc<Hub<T>>,
}

impl<T> Clone for ConnectableObservable<T> {
    fn clone(&self) -> Self {
        ConnectableObservable {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<T: Clone + Send + 'static> ConnectableObservable<T> {
    /// Creates a new instance of a `ConnectableObservable`.
    ///
    /// Typically, you will not directly use this method. Instead, the [`publish()`]
    /// operator is used to create instances more conveniently.
    ///
    /// [`publish()`]: super::ObservableExt::publish
    pub fn new(source: Arc<dyn Subscribeable<Item = T> + Send + Sync>) -> Self {
        ConnectableObservable {
            hub: Arc::new(Hub {
                source,
                state: Mutex::new(HubState {
                    registry: Vec::new(),
                    next_key: 0,
                    generation: 0,
                    connection: None,
                }),
            }),
        }
    }

    /// Subscribes the shared source, starting a new generation.
    ///
    /// If the current generation is still running, nothing happens and its
    /// connection handle is returned. Cancelling the returned `Disposable`
    /// disconnects the source; registered subscribers receive no terminal event.
    pub fn connect(&self) -> Disposable {
        let (connection, generation) = {
            let mut state = lock(&self.hub.state);
            if let Some(live) = state.live_connection() {
                return live.clone();
            }
            state.registry.retain(|e| !e.token.is_cancelled());
            let connection = Disposable::new();
            state.connection = Some(connection.clone());
            debug!(
                generation = state.generation,
                subscribers = state.registry.len(),
                "connecting multicast source"
            );
            (connection, state.generation)
        };

        let hub = Arc::downgrade(&self.hub);
        connection.add(Teardown::Logic(Box::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.close_generation(generation);
            }
        })));

        let relay = Relay {
            hub: Arc::clone(&self.hub),
            generation,
        };
        self.hub
            .source
            .subscribe(Subscriber::chained(&connection, relay));
        connection
    }

    /// Returns an observable connecting this one as soon as `n` subscribers have
    /// registered through it. `n == 0` connects right away.
    pub fn auto_connect(&self, n: usize) -> Observable<T> {
        self.auto_connect_with(n, |_| {})
    }

    /// Like [`auto_connect`](Self::auto_connect), handing the connection to
    /// `on_connect` so that the caller can disconnect later.
    pub fn auto_connect_with(
        &self,
        n: usize,
        on_connect: impl Fn(Disposable) + Send + Sync + 'static,
    ) -> Observable<T> {
        let registered = AtomicUsize::new(0);
        if n == 0 {
            on_connect(self.connect());
        }
        let connectable = self.clone();
        Observable::new(move |o| {
            let (token, added) = connectable.register(o);
            if added && n > 0 && registered.fetch_add(1, Ordering::AcqRel) + 1 == n {
                debug!(subscribers = n, "auto-connect threshold reached");
                on_connect(connectable.connect());
            }
            token
        })
    }

    /// Number of registered subscribers that have not cancelled.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let state = lock(&self.hub.state);
        state
            .registry
            .iter()
            .filter(|e| !e.token.is_cancelled())
            .count()
    }

    /// Index of the current generation. Starts at `0` and grows by one every time a
    /// generation ends.
    #[must_use]
    pub fn generation(&self) -> u64 {
        lock(&self.hub.state).generation
    }

    /// Whether the source is subscribed right now.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        lock(&self.hub.state).live_connection().is_some()
    }
}

impl<T: 'static> ConnectableObservable<T> {
    /// Adds `s` to the registry unless it is already cancelled. Returns its token
    /// and whether it was added.
    fn register(&self, mut s: Subscriber<T>) -> (Disposable, bool) {
        let token = s.disposable();
        s.activate();
        if token.is_cancelled() {
            return (token, false);
        }

        let key = {
            let mut state = lock(&self.hub.state);
            let key = state.next_key;
            state.next_key += 1;
            state.registry.push(Entry {
                key,
                token: token.clone(),
                subscriber: Arc::new(Mutex::new(s)),
            });
            key
        };

        let hub = Arc::downgrade(&self.hub);
        token.add(Teardown::Logic(Box::new(move || {
            if let Some(hub) = hub.upgrade() {
                hub.deregister(key);
            }
        })));
        (token, true)
    }
}

impl<T: Clone + Send + 'static> Subscribeable for ConnectableObservable<T> {
    type Item = T;

    fn subscribe(&self, s: Subscriber<T>) -> Disposable {
        self.register(s).0
    }
}
