//! Provides structures related to subscription management.
//!
//! This module includes `Subscriber`, the guard that enforces the event protocol for
//! one subscription, and `Disposable`, the cancellation handle returned by every
//! `subscribe` call.
pub mod disposable;
pub mod subscribe;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Poisoned locks are recovered: user callbacks may panic while one is held.
pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
