mod test_subscriber;

use std::{convert::Infallible, thread, time::Duration};

use rxflow::{
    create, from_callable, interval, range, schedulers, ObservableExt, Observer, Subscribeable,
};
use test_subscriber::{init_tracing, TestSubscriber};
use tracing::info;

#[test]
fn from_callable_runs_the_supplier_on_a_new_thread() {
    init_tracing();
    let probe = TestSubscriber::new();

    from_callable(|| {
        thread::sleep(Duration::from_secs(2));
        info!("finished the callable");
        Ok::<_, Infallible>("done")
    })
    .subscribe_on(schedulers::new_thread())
    .subscribe(probe.subscriber());

    assert!(probe.await_terminal(Duration::from_millis(2_500)));
    probe.assert_completed();
    probe.assert_value_count(1);
    probe.assert_value("done");
    probe.assert_delivered_on("rx-newthread-");
}

#[test]
fn range_emits_every_number_then_completes() {
    let probe = TestSubscriber::new();

    range(1, 100).subscribe(probe.subscriber());

    assert!(probe.await_terminal(Duration::from_secs(1)));
    probe.assert_completed();
    probe.assert_value_count(100);
    assert_eq!(probe.values(), (1..=100).collect::<Vec<i32>>());
}

#[test]
fn interval_limited_by_a_time_window() {
    init_tracing();
    let probe = TestSubscriber::new();

    interval(Duration::from_millis(1), Duration::from_millis(500))
        .take_for(Duration::from_millis(2_750))
        .subscribe(probe.subscriber());

    assert!(probe.await_terminal(Duration::from_millis(3_000)));
    probe.assert_completed();
    probe.assert_value_count(6);
    assert_eq!(probe.values(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn create_stops_once_the_subscriber_cancels() {
    init_tracing();
    let probe = TestSubscriber::new();

    create(|mut subscriber| {
        for i in 0..5 {
            if subscriber.is_cancelled() {
                return;
            }
            thread::sleep(Duration::from_secs(1));
            info!(value = i, "slow operation finished");

            if subscriber.is_cancelled() {
                return;
            }
            subscriber.next(i);
        }
        if !subscriber.is_cancelled() {
            subscriber.complete();
        }
    })
    .subscribe_on(schedulers::io())
    .subscribe(probe.subscriber());

    let terminated = probe.await_terminal_and_cancel_on_timeout(Duration::from_millis(2_500));

    assert!(!terminated);
    probe.assert_not_completed();
    probe.assert_value_count(2);

    // The producer notices the cancellation after its next slow operation.
    thread::sleep(Duration::from_millis(1_000));
    probe.assert_value_count(2);
    probe.assert_not_completed();
}
