//! Subscribes to a range of numbers, once with a hand-written observer and once
//! with closures.
//!
//! Run with `cargo run --example quick_introduction`.

use rxflow::{range, Observer, SourceError, Subscribeable, Subscriber};

struct Printer;

impl Observer for Printer {
    type Item = i32;

    fn next(&mut self, number: i32) {
        println!("{}", number);
    }

    fn error(&mut self, err: SourceError) {
        println!("error: {}", err);
    }

    fn complete(&mut self) {
        println!("completed");
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let source = range(1, 5);

    println!("-- verbose version");
    source.subscribe(Subscriber::from_observer(Printer));

    println!("-- concise version");
    source.subscribe(Subscriber::new(
        |number| println!("{}", number),
        |err| println!("error: {}", err),
        || println!("completed"),
    ));
}
