use crate::errors::SourceError;

/// Sink receiving the events of one subscription.
///
/// `next` may be called any number of times, followed by at most one of `error` or
/// `complete`. Producers query `is_cancelled` between emissions and stop as soon as
/// it returns `true`.
pub trait Observer {
    type Item;

    fn next(&mut self, value: Self::Item);
    fn error(&mut self, err: SourceError);
    fn complete(&mut self);

    /// Returns `true` once the consumer is no longer interested in events.
    fn is_cancelled(&self) -> bool {
        false
    }
}
