//! Execution contexts used to relocate subscriptions and event delivery.
//!
//! A [`Scheduler`] hands out [`Worker`]s. Every worker runs the tasks submitted to
//! it one at a time, in submission order. Three policies are provided:
//!
//! - [`new_thread`]: one dedicated OS thread per worker.
//! - [`io`]: an elastic, reusable thread pool for blocking work.
//! - [`computation`]: a fixed pool sized to the CPU count. It also times every
//!   delayed and periodic task.
//!
//! The pools start lazily. Their sizing comes from [`SchedulerConfig`], read from
//! the environment unless [`configure`] installed one before the first use.
mod computation;
mod config;
mod io;
mod new_thread;
mod runtime;
mod worker;


pub use computation::ComputationScheduler;
pub use config::SchedulerConfig;
pub use io::IoScheduler;
pub use new_thread::NewThreadScheduler;
pub use worker::Worker;

use crate::errors::RxError;

/// Factory of [`Worker`]s.
pub trait Scheduler: Send + Sync {
    fn create_worker(&self) -> Worker;
}

/// Returns a scheduler giving each worker a new dedicated thread.
#[must_use]
pub fn new_thread() -> NewThreadScheduler {
    NewThreadScheduler
}

/// Returns the scheduler backed by the shared elastic I/O pool.
#[must_use]
pub fn io() -> IoScheduler {
    IoScheduler
}

/// Returns the scheduler backed by the shared fixed-size computation pool.
#[must_use]
pub fn computation() -> ComputationScheduler {
    ComputationScheduler
}

/// Installs the configuration used by every scheduler.
///
/// Must run before any scheduler is first used, otherwise it returns
/// [`RxError::SchedulersStarted`] and the configuration in effect is kept.
pub fn configure(config: SchedulerConfig) -> Result<(), RxError> {
    runtime::install(config)
}
