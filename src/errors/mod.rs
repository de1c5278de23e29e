//! Error values carried by `error` notifications and raised by the crate itself.

mod observable_errors;

pub use observable_errors::*;
