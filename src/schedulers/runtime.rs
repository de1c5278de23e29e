use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use super::config::SchedulerConfig;
use crate::errors::RxError;

static SETTINGS: OnceLock<SchedulerConfig> = OnceLock::new();
static COMPUTATION: OnceLock<Runtime> = OnceLock::new();
static IO: OnceLock<Runtime> = OnceLock::new();

pub(crate) fn install(config: SchedulerConfig) -> Result<(), RxError> {
    config.validate()?;
    SETTINGS
        .set(config)
        .map_err(|_| RxError::SchedulersStarted)
}

/// Configuration in effect, loaded from the environment on first use.
pub(crate) fn settings() -> &'static SchedulerConfig {
    SETTINGS.get_or_init(|| match SchedulerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "ignoring scheduler configuration from the environment");
            SchedulerConfig::default()
        }
    })
}

pub(crate) fn thread_name(kind: &str, id: usize) -> String {
    format!("{}-{}-{}", settings().thread_name_prefix, kind, id)
}

fn numbered_names(kind: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let next = Arc::new(AtomicUsize::new(0));
    move || thread_name(kind, next.fetch_add(1, Ordering::Relaxed))
}

/// Fixed-size runtime running computation workers and every timer.
pub(crate) fn computation() -> &'static Runtime {
    COMPUTATION.get_or_init(|| {
        let config = settings();
        let mut builder = Builder::new_multi_thread();
        builder
            .thread_name_fn(numbered_names("computation"))
            .enable_time();
        if let Some(threads) = config.computation_threads {
            builder.worker_threads(threads);
        }
        debug!(threads = ?config.computation_threads, "starting computation runtime");
        builder
            .build()
            .expect("failed to build the computation runtime")
    })
}

/// Runtime dispatching I/O workers. Their tasks run on its elastic blocking pool.
pub(crate) fn io() -> &'static Runtime {
    IO.get_or_init(|| {
        let config = settings();
        debug!(
            max_threads = config.io_max_threads,
            keep_alive = ?config.io_keep_alive,
            "starting io runtime"
        );
        Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.io_max_threads)
            .thread_keep_alive(config.io_keep_alive)
            .thread_name_fn(numbered_names("io"))
            .build()
            .expect("failed to build the io runtime")
    })
}
