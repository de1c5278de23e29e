use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error value delivered through [`Observer::error`].
///
/// Wrapped in an `Arc` so that a multicast hub can hand the same failure to every
/// registered subscriber without requiring the underlying error to be `Clone`.
///
/// [`Observer::error`]: crate::Observer::error
pub type SourceError = Arc<dyn Error + Send + Sync>;

/// Failures originating inside the crate rather than in user supplied sources.
#[derive(Debug)]
pub enum RxError {
    /// User code running inside a factory or a scheduled task panicked.
    Panicked {
        context: &'static str,
        message: String,
    },
    /// A factory received arguments it cannot honor.
    InvalidArgument {
        name: &'static str,
        reason: String,
    },
    /// A scheduler configuration value could not be parsed.
    InvalidConfig { key: &'static str, value: String },
    /// `schedulers::configure` was called after the shared runtimes started.
    SchedulersStarted,
}

impl RxError {
    pub(crate) fn from_panic(context: &'static str, payload: Box<dyn Any + Send>) -> Self {
        RxError::Panicked {
            context,
            message: panic_message(payload.as_ref()),
        }
    }

    /// Wraps this error into the shared form carried by `error` notifications.
    #[must_use]
    pub fn into_source_error(self) -> SourceError {
        Arc::new(self)
    }
}

impl fmt::Display for RxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Panicked { context, message } => write!(f, "{} panicked: {}", context, message),
            Self::InvalidArgument { name, reason } => {
                write!(f, "invalid argument `{}`: {}", name, reason)
            }
            Self::InvalidConfig { key, value } => {
                write!(f, "invalid value {:?} for configuration key {}", value, key)
            }
            Self::SchedulersStarted => {
                write!(f, "schedulers are already running and can no longer be configured")
            }
        }
    }
}

impl Error for RxError {}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
