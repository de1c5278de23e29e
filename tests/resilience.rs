mod custom_error;
mod test_subscriber;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use custom_error::ServiceError;
use rxflow::{from_callable, Observable, ObservableExt, Subscribeable};
use test_subscriber::{init_tracing, TestSubscriber};

const WAIT: Duration = Duration::from_secs(1);

/// A fake remote service answering with a canned result and counting its calls.
#[derive(Clone)]
struct Service {
    response: Result<&'static str, &'static str>,
    calls: Arc<AtomicUsize>,
}

impl Service {
    fn failing(reason: &'static str) -> Self {
        Service {
            response: Err(reason),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn answering(result: &'static str) -> Self {
        Service {
            response: Ok(result),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn process_request(&self) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .map(str::to_string)
            .map_err(|reason| ServiceError { reason })
    }

    fn requests(&self) -> Observable<String> {
        let service = self.clone();
        from_callable(move || service.process_request())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[test]
fn handles_error_using_on_error() {
    init_tracing();
    let service = Service::failing("io error");
    let probe = TestSubscriber::new();

    service.requests().subscribe(probe.subscriber());

    assert!(probe.await_terminal(WAIT));
    probe.assert_no_values();
    probe.assert_not_completed();
    probe.assert_error::<ServiceError>();
}

#[test]
fn handles_error_by_returning_some_value() {
    init_tracing();
    let service = Service::failing("io error");
    let probe = TestSubscriber::new();

    service
        .requests()
        .on_error_return(|_| "default".to_string())
        .subscribe(probe.subscriber());

    assert!(probe.await_terminal(WAIT));
    probe.assert_value("default".to_string());
    probe.assert_completed();
    probe.assert_no_errors();
}

#[test]
fn handles_error_by_subscribing_to_another_observable() {
    init_tracing();
    let service = Service::failing("io error");
    let another_service = Service::answering("result");
    let probe = TestSubscriber::new();

    service
        .requests()
        .on_error_resume_next(another_service.requests())
        .subscribe(probe.subscriber());

    assert!(probe.await_terminal(WAIT));
    probe.assert_value("result".to_string());
    probe.assert_completed();
    probe.assert_no_errors();
    assert_eq!(service.calls(), 1);
    assert_eq!(another_service.calls(), 1);
}

#[test]
fn fallback_is_not_subscribed_when_the_source_succeeds() {
    let service = Service::answering("first");
    let another_service = Service::answering("second");
    let probe = TestSubscriber::new();

    service
        .requests()
        .on_error_resume_next(another_service.requests())
        .subscribe(probe.subscriber());

    probe.assert_value("first".to_string());
    probe.assert_completed();
    assert_eq!(another_service.calls(), 0);
}

#[test]
fn error_from_the_fallback_reaches_the_subscriber() {
    let probe = TestSubscriber::new();

    Service::failing("primary down")
        .requests()
        .on_error_resume_next(Service::failing("backup down").requests())
        .subscribe(probe.subscriber());

    probe.assert_no_values();
    probe.assert_error::<ServiceError>();
}
