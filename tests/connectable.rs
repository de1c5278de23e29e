mod generate_observable;
mod test_subscriber;

use std::{
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use generate_observable::generate_u32_observable;
use rxflow::{defer, just, ObservableExt, Subscribeable};
use test_subscriber::{init_tracing, TestSubscriber};
use tracing::info;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn does_not_start_emitting_events_till_connect_is_called() {
    init_tracing();
    let probe = TestSubscriber::new();
    let observable = just("test")
        .do_on_next(|v| info!(value = %v, "emitting"))
        .publish();

    observable.subscribe(probe.subscriber());
    probe.assert_no_values();
    assert_eq!(observable.subscriber_count(), 1);
    assert!(!observable.is_connected());

    observable.connect();

    assert!(probe.await_terminal(WAIT));
    probe.assert_value("test");
    probe.assert_completed();
}

#[test]
fn multicasts_same_event_to_multiple_subscribers() {
    init_tracing();
    let probe1 = TestSubscriber::new();
    let probe2 = TestSubscriber::new();
    let observable = defer(|| just(Instant::now()))
        .do_on_next(|i| info!(instant = ?i, "emitting"))
        .publish();

    observable.subscribe(probe1.subscriber());
    observable.subscribe(probe2.subscriber());
    observable.connect();

    assert!(probe1.await_terminal(WAIT));
    assert!(probe2.await_terminal(WAIT));
    probe1.assert_value_count(1);
    assert_eq!(probe1.values(), probe2.values());
}

#[test]
fn connect_has_to_be_called_again_to_restart_after_completed() {
    init_tracing();
    let probe1 = TestSubscriber::new();
    let probe2 = TestSubscriber::new();
    let observable = defer(|| just(Instant::now()))
        .do_on_next(|i| info!(instant = ?i, "emitting"))
        .publish();

    observable.subscribe(probe1.subscriber());
    observable.connect();
    assert!(probe1.await_terminal(WAIT));
    probe1.assert_value_count(1);
    assert_eq!(observable.generation(), 1);
    assert!(!observable.is_connected());

    thread::sleep(Duration::from_millis(2));

    observable.subscribe(probe2.subscriber());
    observable.connect();
    assert!(probe2.await_terminal(WAIT));
    probe2.assert_value_count(1);

    assert_ne!(probe1.values()[0], probe2.values()[0]);
    // The first subscriber already terminated and sees nothing of the rerun.
    probe1.assert_value_count(1);
}

#[test]
fn auto_connects_to_source_after_a_specified_number_of_subscribers() {
    init_tracing();
    let probe1 = TestSubscriber::new();
    let probe2 = TestSubscriber::new();
    let observable = defer(|| just(Instant::now()))
        .do_on_next(|i| info!(instant = ?i, "emitting"))
        .publish()
        .auto_connect(2);

    observable.subscribe(probe1.subscriber());
    probe1.assert_no_values();
    observable.subscribe(probe2.subscriber());

    probe1.assert_value_count(1);
    probe1.assert_completed();
    probe2.assert_value_count(1);
    probe2.assert_completed();
    assert_eq!(probe1.values()[0], probe2.values()[0]);
}

#[test]
fn threaded_source_is_shared_and_disconnectable() {
    init_tracing();
    let (tx, rx) = mpsc::channel();
    let probe1 = TestSubscriber::new();
    let probe2 = TestSubscriber::new();
    let observable = generate_u32_observable(10_000, move |last| {
        let _ = tx.send(last);
    })
    .publish();

    observable.subscribe(probe1.subscriber());
    observable.subscribe(probe2.subscriber());
    let connection = observable.connect();

    thread::sleep(Duration::from_millis(50));
    connection.cancel();

    let last = rx.recv_timeout(WAIT).unwrap();
    assert!(last < 10_000, "source kept running after disconnect");
    assert!(!observable.is_connected());

    // Disconnecting is not a terminal event for the subscribers.
    probe1.assert_not_completed();
    probe2.assert_not_completed();
    assert_eq!(probe1.values(), probe2.values());
    assert_eq!(
        probe1.values(),
        (0..probe1.values().len() as u32).collect::<Vec<_>>()
    );
}

#[test]
fn cancelled_subscriber_stops_receiving_while_others_continue() {
    let (tx, rx) = mpsc::channel();
    let probe1 = TestSubscriber::new();
    let probe2 = TestSubscriber::new();
    let observable = generate_u32_observable(30, move |last| {
        let _ = tx.send(last);
    })
    .publish();

    observable.subscribe(probe1.subscriber());
    observable.subscribe(probe2.subscriber());
    probe1.cancel();
    assert_eq!(observable.subscriber_count(), 1);

    observable.connect();

    assert!(probe2.await_terminal(WAIT));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 30);
    probe1.assert_no_values();
    probe2.assert_value_count(31);
    probe2.assert_completed();
}
