//! Shows on which threads the source, an operator and the subscriber run when
//! `subscribe_on` and `observe_on` are combined.
//!
//! Run with `RUST_LOG=debug cargo run --example multithreading` to also see the
//! scheduler events.

use std::{convert::Infallible, sync::mpsc, thread, time::Duration};

use rxflow::{from_callable, schedulers, Observable, ObservableExt, Subscribeable, Subscriber};

fn thread_name() -> String {
    thread::current().name().unwrap_or("<unnamed>").to_string()
}

fn number_one() -> Observable<i32> {
    from_callable(|| {
        println!("Observable thread: {}", thread_name());
        Ok::<_, Infallible>(1)
    })
}

fn number_to_string(number: i32) -> String {
    println!("Operator thread: {}", thread_name());
    number.to_string()
}

/// Subscribes `pipeline` and waits until it terminates.
fn run(title: &str, pipeline: Observable<String>) {
    println!("-- {}", title);
    let (done_tx, done_rx) = mpsc::channel();
    let error_tx = done_tx.clone();

    pipeline.subscribe(Subscriber::new(
        |result| {
            println!("Subscriber thread: {}", thread_name());
            println!("Result: {}", result);
        },
        move |err| {
            println!("Failed: {}", err);
            let _ = error_tx.send(());
        },
        move || {
            let _ = done_tx.send(());
        },
    ));

    if done_rx.recv_timeout(Duration::from_secs(5)).is_err() {
        println!("timed out");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_names(true)
        .init();

    run("blocking", number_one().map(number_to_string));
    run(
        "source on a new thread",
        number_one()
            .subscribe_on(schedulers::new_thread())
            .map(number_to_string),
    );
    run(
        "subscriber on a new thread",
        number_one()
            .map(number_to_string)
            .observe_on(schedulers::new_thread()),
    );
    run(
        "operator on a new thread",
        number_one()
            .observe_on(schedulers::new_thread())
            .map(number_to_string),
    );
    run(
        "source, operator and subscriber on different threads",
        number_one()
            .subscribe_on(schedulers::new_thread())
            .observe_on(schedulers::io())
            .map(number_to_string)
            .observe_on(schedulers::computation()),
    );
}
