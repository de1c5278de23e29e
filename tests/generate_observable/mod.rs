#![allow(dead_code)]

use std::{sync::Arc, thread, time::Duration};

use rxflow::{Observable, Observer, Subscriber};

/// Emits `0..=end` from a dedicated thread, one value per millisecond, and stops
/// early once the subscriber is cancelled. The last emitted value is handed to
/// `last_emit_assert` when the thread finishes.
pub fn generate_u32_observable(
    end: u32,
    last_emit_assert: impl Fn(u32) + Send + Sync + 'static,
) -> Observable<u32> {
    let last_emit_assert = Arc::new(last_emit_assert);

    Observable::new(move |mut o: Subscriber<_>| {
        let token = o.disposable();
        let last_emit_assert = Arc::clone(&last_emit_assert);

        thread::spawn(move || {
            let mut last_emit = 0;
            for i in 0..=end {
                if o.is_cancelled() {
                    break;
                }
                last_emit = i;
                o.next(i);
                thread::sleep(Duration::from_millis(1));
            }
            o.complete();
            last_emit_assert(last_emit);
        });
        token
    })
}
