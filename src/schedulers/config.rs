use std::time::Duration;

use crate::errors::RxError;

const COMPUTATION_THREADS: &str = "RXFLOW_COMPUTATION_THREADS";
const IO_MAX_THREADS: &str = "RXFLOW_IO_MAX_THREADS";
const IO_KEEP_ALIVE_MS: &str = "RXFLOW_IO_KEEP_ALIVE_MS";
const THREAD_PREFIX: &str = "RXFLOW_THREAD_PREFIX";

/// Sizing and naming of the threads backing the built-in schedulers.
///
/// Read once, the first time any scheduler is used. Install a custom value with
/// [`configure`](super::configure) before that point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker threads of the computation runtime. `None` means one per CPU core.
    pub computation_threads: Option<usize>,
    /// Upper bound of the elastic pool running I/O tasks.
    pub io_max_threads: usize,
    /// How long an idle I/O thread is kept before it is released.
    pub io_keep_alive: Duration,
    /// Prefix of every thread name, e.g. `rx` gives `rx-io-3`.
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            computation_threads: None,
            io_max_threads: 512,
            io_keep_alive: Duration::from_secs(60),
            thread_name_prefix: "rx".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Builds a configuration from the `RXFLOW_*` environment variables, using the
    /// defaults for the ones that are not set.
    pub fn from_env() -> Result<Self, RxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RxError> {
        let mut config = SchedulerConfig::default();

        if let Some(value) = lookup(COMPUTATION_THREADS) {
            config.computation_threads = Some(parse_positive(COMPUTATION_THREADS, &value)?);
        }
        if let Some(value) = lookup(IO_MAX_THREADS) {
            config.io_max_threads = parse_positive(IO_MAX_THREADS, &value)?;
        }
        if let Some(value) = lookup(IO_KEEP_ALIVE_MS) {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(IO_KEEP_ALIVE_MS, &value))?;
            config.io_keep_alive = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(THREAD_PREFIX) {
            if value.trim().is_empty() {
                return Err(invalid(THREAD_PREFIX, &value));
            }
            config.thread_name_prefix = value.trim().to_string();
        }

        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), RxError> {
        if self.computation_threads == Some(0) {
            return Err(invalid(COMPUTATION_THREADS, "0"));
        }
        if self.io_max_threads == 0 {
            return Err(invalid(IO_MAX_THREADS, "0"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(invalid(THREAD_PREFIX, ""));
        }
        Ok(())
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, RxError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &'static str, value: &str) -> RxError {
    RxError::InvalidConfig {
        key,
        value: value.to_string(),
    }
}
