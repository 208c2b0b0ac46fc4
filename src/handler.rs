//! Application-supplied event handlers.

/// Processes payloads delivered to one subscriber.
///
/// A handler is owned by exactly one subscriber and invoked only from that
/// subscriber's worker thread, one payload at a time. While `handle` runs,
/// the subscriber accepts nothing else, so a handler that blocks stalls the
/// emitter's fan-out to it.
///
/// A panic inside `handle` terminates the subscriber's worker.
pub trait EventHandler<P>: Send + 'static {
    /// Handle one payload.
    fn handle(&mut self, payload: P);
}

impl<P, F> EventHandler<P> for F
where
    F: FnMut(P) + Send + 'static,
{
    fn handle(&mut self, payload: P) {
        self(payload);
    }
}
