//! Cancellation handles and the teardown logic attached to them.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tokio::task::AbortHandle;

use super::lock;

/// Cleanup performed when a [`Disposable`] is cancelled.
pub enum Teardown {
    /// No cleanup.
    Nil,

    /// Cancel another `Disposable`, typically the one of an upstream stage.
    Wrapped(Disposable),

    /// Arbitrary cleanup logic.
    Logic(Box<dyn FnOnce() + Send>),

    /// Abort a pending timer task.
    Abort(AbortHandle),
}

impl Teardown {
    fn run(self) {
        match self {
            Teardown::Nil => (),
            Teardown::Wrapped(disposable) => disposable.cancel(),
            Teardown::Logic(fnc) => fnc(),
            Teardown::Abort(handle) => handle.abort(),
        }
    }
}

struct Inner {
    cancelled: AtomicBool,
    teardowns: Mutex<Vec<Teardown>>,
}

/// Cancellable handle tied to one subscription, scheduled task or worker.
///
/// Clones refer to the same handle. `cancel` is idempotent: the first call flips the
/// handle to the cancelled state and runs every registered [`Teardown`] exactly once,
/// later calls do nothing. Teardowns added after cancellation run immediately.
#[derive(Clone)]
pub struct Disposable {
    inner: Arc<Inner>,
}

impl Disposable {
    /// Creates an active handle with no teardown attached.
    #[must_use]
    pub fn new() -> Self {
        Disposable {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                teardowns: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates an active handle running `fnc` upon cancellation.
    pub fn from_logic(fnc: impl FnOnce() + Send + 'static) -> Self {
        let d = Disposable::new();
        d.add(Teardown::Logic(Box::new(fnc)));
        d
    }

    /// Creates a handle that is already cancelled.
    #[must_use]
    pub fn cancelled() -> Self {
        let d = Disposable::new();
        d.cancel();
        d
    }

    /// Registers cleanup to run on cancellation, or runs it now if already cancelled.
    ///
    /// Wrapped handles that were cancelled on their own in the meantime are
    /// dropped from the list.
    pub fn add(&self, teardown: Teardown) {
        if let Teardown::Wrapped(other) = &teardown {
            if other.ptr_eq(self) {
                return;
            }
        }
        {
            let mut teardowns = lock(&self.inner.teardowns);
            if !self.inner.cancelled.load(Ordering::Acquire) {
                teardowns.retain(|t| !matches!(t, Teardown::Wrapped(d) if d.is_cancelled()));
                teardowns.push(teardown);
                return;
            }
        }
        teardown.run();
    }

    /// Derives a handle that is cancelled together with `self` but can also be
    /// cancelled on its own without affecting `self`.
    #[must_use]
    pub fn child(&self) -> Disposable {
        let child = Disposable::new();
        self.add(Teardown::Wrapped(child.clone()));
        child
    }

    /// Cancels the handle and releases everything attached to it.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let teardowns = std::mem::take(&mut *lock(&self.inner.teardowns));
        for teardown in teardowns {
            teardown.run();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` if both handles refer to the same underlying state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Disposable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Disposable {
    fn default() -> Self {
        Disposable::new()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
