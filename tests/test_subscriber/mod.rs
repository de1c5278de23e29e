#![allow(dead_code)]

use std::{
    error::Error,
    fmt::Debug,
    sync::{Arc, Condvar, Mutex},
    thread,
    time::Duration,
};

use rxflow::{Disposable, SourceError, Subscriber};

/// Installs a `tracing` subscriber writing through the test harness. Safe to call
/// from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .with_thread_names(true)
        .try_init();
}

struct Recorded<T> {
    values: Vec<T>,
    errors: Vec<SourceError>,
    completions: usize,
    threads: Vec<String>,
}

impl<T> Recorded<T> {
    fn terminated(&self) -> bool {
        self.completions > 0 || !self.errors.is_empty()
    }
}

/// Records every event of one subscription and lets the test block until the
/// stream terminates.
pub struct TestSubscriber<T> {
    shared: Arc<(Mutex<Recorded<T>>, Condvar)>,
    token: Mutex<Option<Disposable>>,
}

impl<T: Clone + Debug + Send + 'static> TestSubscriber<T> {
    pub fn new() -> Self {
        TestSubscriber {
            shared: Arc::new((
                Mutex::new(Recorded {
                    values: Vec::new(),
                    errors: Vec::new(),
                    completions: 0,
                    threads: Vec::new(),
                }),
                Condvar::new(),
            )),
            token: Mutex::new(None),
        }
    }

    /// A subscriber feeding this recorder. Only one should be subscribed per
    /// recorder.
    pub fn subscriber(&self) -> Subscriber<T> {
        let on_next = Arc::clone(&self.shared);
        let on_error = Arc::clone(&self.shared);
        let on_complete = Arc::clone(&self.shared);

        let subscriber = Subscriber::new(
            move |v| {
                let name = thread::current().name().unwrap_or("<unnamed>").to_string();
                let mut recorded = on_next.0.lock().unwrap();
                recorded.values.push(v);
                recorded.threads.push(name);
            },
            move |e| {
                on_error.0.lock().unwrap().errors.push(e);
                on_error.1.notify_all();
            },
            move || {
                on_complete.0.lock().unwrap().completions += 1;
                on_complete.1.notify_all();
            },
        );
        *self.token.lock().unwrap() = Some(subscriber.disposable());
        subscriber
    }

    /// Blocks until a terminal event arrives or `timeout` elapses. Returns whether
    /// the stream terminated.
    pub fn await_terminal(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.shared;
        let guard = lock.lock().unwrap();
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |r| !r.terminated())
            .unwrap();
        guard.terminated()
    }

    /// Like [`await_terminal`](Self::await_terminal), cancelling the subscription
    /// when the stream did not terminate in time.
    pub fn await_terminal_and_cancel_on_timeout(&self, timeout: Duration) -> bool {
        let terminated = self.await_terminal(timeout);
        if !terminated {
            self.cancel();
        }
        terminated
    }

    pub fn cancel(&self) {
        if let Some(token) = self.token.lock().unwrap().as_ref() {
            token.cancel();
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.shared.0.lock().unwrap().values.clone()
    }

    pub fn threads(&self) -> Vec<String> {
        self.shared.0.lock().unwrap().threads.clone()
    }

    pub fn assert_value_count(&self, expected: usize) {
        let values = self.values();
        assert_eq!(
            values.len(),
            expected,
            "expected {} values, received {:?}",
            expected,
            values
        );
    }

    pub fn assert_no_values(&self) {
        self.assert_value_count(0);
    }

    pub fn assert_completed(&self) {
        let completions = self.shared.0.lock().unwrap().completions;
        assert_eq!(completions, 1, "expected exactly one completion");
    }

    pub fn assert_not_completed(&self) {
        let completions = self.shared.0.lock().unwrap().completions;
        assert_eq!(completions, 0, "stream completed unexpectedly");
    }

    pub fn assert_no_errors(&self) {
        let recorded = self.shared.0.lock().unwrap();
        assert!(
            recorded.errors.is_empty(),
            "unexpected errors: {:?}",
            recorded.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>()
        );
    }

    /// Asserts a single error of type `E` was received.
    pub fn assert_error<E: Error + 'static>(&self) {
        let recorded = self.shared.0.lock().unwrap();
        assert_eq!(recorded.errors.len(), 1, "expected exactly one error");
        assert!(
            recorded.errors[0].downcast_ref::<E>().is_some(),
            "error {:?} has an unexpected type",
            recorded.errors[0].to_string()
        );
    }

    /// Asserts every value was observed on a thread whose name starts with `prefix`.
    pub fn assert_delivered_on(&self, prefix: &str) {
        let threads = self.threads();
        assert!(!threads.is_empty(), "no values were delivered");
        assert!(
            threads.iter().all(|t| t.starts_with(prefix)),
            "values delivered on {:?}, expected threads starting with {:?}",
            threads,
            prefix
        );
    }
}

impl<T: Clone + Debug + PartialEq + Send + 'static> TestSubscriber<T> {
    pub fn assert_value(&self, expected: T) {
        assert_eq!(self.values(), vec![expected]);
    }
}
