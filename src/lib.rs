//! Push-based reactive streams for Rust.
//!
//! An [`Observable`] is a recipe producing events for a [`Subscriber`]: any number of
//! values followed by at most one terminal event, either an error or completion.
//! Operators from [`ObservableExt`] wrap observables into new ones, and
//! [`schedulers`] provide the threads that subscriptions and deliveries can be moved
//! to. [`ConnectableObservable`] shares one run of a source among many subscribers.
//!
//! Every `subscribe` call returns a [`Disposable`]. Cancelling it stops the whole
//! chain feeding that subscriber and releases the workers and timers it used.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use rxflow::{interval, schedulers, ObservableExt, Subscribeable, Subscriber};
//!
//! interval(Duration::from_millis(1), Duration::from_millis(500))
//!     .map(|tick| tick * 10)
//!     .take_for(Duration::from_millis(2_750))
//!     .observe_on(schedulers::new_thread())
//!     .subscribe(Subscriber::new(
//!         |v| println!("tick {}", v),
//!         |e| eprintln!("failed: {}", e),
//!         || println!("done"),
//!     ));
//!
//! std::thread::sleep(Duration::from_secs(3));
//! ```
//!
//! The crate logs through [`tracing`]; install a subscriber such as
//! `tracing-subscriber` to see scheduler, connection and protocol events.

mod errors;
mod observable;
mod observer;
pub mod schedulers;
mod subscription;

pub use errors::*;
pub use observable::*;
pub use observer::*;
pub use subscription::*;

pub use schedulers::{Scheduler, Worker};
pub use subscription::{
    disposable::{Disposable, Teardown},
    subscribe::{Subscribeable, Subscriber, SubscriptionState},
};
