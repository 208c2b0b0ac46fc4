//! Emitter actor.
//!
//! The emitter owns a closed vocabulary of event names and a registry of
//! subscribers per name. Callers fire events through a cheap, cloneable
//! handle; a dedicated worker thread fans each event out to the registered
//! subscribers in registration order.
//!
//! Vocabulary checks happen on the calling thread, so an unknown event name
//! is reported to the caller that used it and never reaches the worker.

/// Emitter worker loop and shutdown protocol.
mod dispatcher;
/// Per-event subscriber lists.
mod registry;

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};

use crate::config::{Delivery, EmitterConfig};
use crate::error::PubSubResult;
use crate::event::{FiredEvent, StopSignal, Vocabulary};
use crate::handoff::handoff;
use crate::subscriber::Subscriber;
use crate::worker;

use dispatcher::{worker_loop, EmitterState, Inboxes, SubscribeRequest};

const ACTOR: &str = "emitter";

/// Handle to a running emitter actor.
///
/// Clones address the same worker and may be used from any thread. Every
/// blocking method returns once the worker has accepted the request.
pub struct Emitter<P> {
    vocabulary: Arc<Vocabulary>,
    fire_tx: Sender<FiredEvent<P>>,
    subscribe_tx: Sender<SubscribeRequest<P>>,
    stop_tx: Sender<StopSignal>,
    timeout: Option<Duration>,
    delivery: Delivery,
    state: Arc<EmitterState>,
}

impl<P: Clone + Send + 'static> Emitter<P> {
    /// Start an emitter accepting exactly `events`, with the default
    /// configuration.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let emitter = Emitter::new(["order.created"])?;
    /// let sub = Subscriber::new(|id: String| println!("created {id}"))?;
    /// emitter.add_subscriber("order.created", &sub)?;
    /// emitter.fire_event("order.created", "ORD-1".to_string())?;
    /// emitter.stop()?;
    /// emitter.join()?;
    /// ```
    pub fn new<I, S>(events: I) -> PubSubResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(events, EmitterConfig::default())
    }

    /// Start an emitter accepting exactly `events`.
    pub fn with_config<I, S>(events: I, cfg: EmitterConfig) -> PubSubResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = Arc::new(Vocabulary::new(events)?);

        let (fire_tx, fire_rx) = bounded::<FiredEvent<P>>(cfg.inbox_capacity);
        // Registrations stay a rendezvous so they are applied before any later fire.
        let (subscribe_tx, subscribe_rx) = bounded::<SubscribeRequest<P>>(0);
        let (stop_tx, stop_rx) = bounded::<StopSignal>(0);
        let state = Arc::new(EmitterState::default());

        let inboxes = Inboxes {
            fire_rx,
            subscribe_rx,
            stop_rx,
        };
        let delivery = cfg.delivery;
        let thread_state = Arc::clone(&state);
        let handle = worker::spawn(cfg.thread_name.clone(), ACTOR, move || {
            worker_loop(delivery, inboxes, &thread_state);
        })?;
        state.worker.set(handle);

        Ok(Self {
            vocabulary,
            fire_tx,
            subscribe_tx,
            stop_tx,
            timeout: cfg.handoff_timeout(),
            delivery,
            state,
        })
    }
}

impl<P> Emitter<P> {
    /// Register `subscriber` for future firings of `event`.
    ///
    /// Fails with a configuration error if `event` is outside the
    /// vocabulary. The registration is applied before the worker accepts
    /// anything else, so a later `fire_event` from the same caller reaches
    /// the new subscriber.
    pub fn add_subscriber(&self, event: &str, subscriber: &Subscriber<P>) -> PubSubResult<()> {
        let event = self.vocabulary.resolve(event)?;
        handoff(
            &self.subscribe_tx,
            SubscribeRequest {
                event,
                subscriber: subscriber.clone(),
            },
            self.timeout,
            ACTOR,
        )
    }

    /// Submit an event for delivery.
    ///
    /// Fails with a configuration error if `event` is outside the
    /// vocabulary. Blocks until the worker accepts the event, not until
    /// subscribers have handled it.
    pub fn fire_event(&self, event: &str, payload: P) -> PubSubResult<()> {
        self.fire(event, payload, self.timeout)
    }

    /// Like [`Emitter::fire_event`], giving up with a timeout error if the
    /// worker does not accept the event within `timeout`.
    pub fn fire_event_timeout(&self, event: &str, payload: P, timeout: Duration) -> PubSubResult<()> {
        self.fire(event, payload, Some(timeout))
    }

    fn fire(&self, event: &str, payload: P, timeout: Option<Duration>) -> PubSubResult<()> {
        let event = self.vocabulary.resolve(event)?;
        handoff(&self.fire_tx, FiredEvent::new(event, payload), timeout, ACTOR)
    }

    /// Request shutdown.
    ///
    /// Once accepted, the worker finishes fanning out everything it already
    /// accepted, stops and joins every registered subscriber exactly once,
    /// and exits. Use [`Emitter::join`] to wait for that to complete.
    pub fn stop(&self) -> PubSubResult<()> {
        self.stop_with(StopSignal::default())
    }

    /// Request shutdown, passing `reason` on to every subscriber.
    pub fn stop_with_reason(&self, reason: &str) -> PubSubResult<()> {
        self.stop_with(StopSignal::new(Some(reason)))
    }

    fn stop_with(&self, signal: StopSignal) -> PubSubResult<()> {
        handoff(&self.stop_tx, signal, self.timeout, ACTOR)
    }

    /// Wait for the worker thread to exit.
    ///
    /// Must not be called from a subscriber's handler while the emitter is
    /// still running, since the worker may be waiting on that handler.
    pub fn join(&self) -> PubSubResult<()> {
        self.state.worker.join(ACTOR)
    }

    /// The event names this emitter accepts.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub const fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Returns true once shutdown has completed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::Acquire)
    }

    /// Number of events fully fanned out so far.
    #[must_use]
    pub fn dispatched_events(&self) -> u64 {
        self.state.dispatched.load(Ordering::Relaxed)
    }
}

impl<P> Clone for Emitter<P> {
    fn clone(&self) -> Self {
        Self {
            vocabulary: Arc::clone(&self.vocabulary),
            fire_tx: self.fire_tx.clone(),
            subscribe_tx: self.subscribe_tx.clone(),
            stop_tx: self.stop_tx.clone(),
            timeout: self.timeout,
            delivery: self.delivery,
            state: Arc::clone(&self.state),
        }
    }
}

impl<P> fmt::Debug for Emitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("vocabulary", &self.vocabulary)
            .field("delivery", &self.delivery)
            .field("stopped", &self.is_stopped())
            .field("dispatched_events", &self.dispatched_events())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::thread;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Subscriber<u32> {
        let log = Arc::clone(log);
        Subscriber::new(move |p: u32| log.lock().unwrap().push(format!("{tag}:{p}"))).unwrap()
    }

    #[test]
    fn fire_without_subscribers_is_a_noop() {
        let emitter = Emitter::<u32>::new(["ping"]).unwrap();
        emitter.fire_event("ping", 1).unwrap();
        emitter.fire_event("ping", 2).unwrap();
        emitter.stop().unwrap();
        emitter.join().unwrap();
        assert_eq!(emitter.dispatched_events(), 2);
    }

    #[test]
    fn unknown_event_is_rejected_at_call_site() {
        let emitter = Emitter::<u32>::new(["ping"]).unwrap();
        let sub = Subscriber::new(|_: u32| {}).unwrap();

        assert!(emitter.fire_event("pong", 1).unwrap_err().is_configuration());
        assert!(emitter.add_subscriber("pong", &sub).unwrap_err().is_configuration());

        emitter.stop().unwrap();
        emitter.join().unwrap();
        assert_eq!(emitter.dispatched_events(), 0);
    }

    #[test]
    fn completion_delivery_orders_handlers_by_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter::with_config(
            ["x"],
            EmitterConfig {
                delivery: Delivery::Completion,
                ..EmitterConfig::default()
            },
        )
        .unwrap();

        for tag in ["a", "b", "c"] {
            emitter.add_subscriber("x", &recorder(&log, tag)).unwrap();
        }
        emitter.fire_event("x", 1).unwrap();
        emitter.fire_event("x", 2).unwrap();
        emitter.stop().unwrap();
        emitter.join().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1", "a:2", "b:2", "c:2"]);
    }

    #[test]
    fn subscriber_on_several_events_is_stopped_once() {
        let emitter = Emitter::<u32>::new(["x", "y"]).unwrap();
        let sub = Subscriber::new(|_: u32| {}).unwrap();
        emitter.add_subscriber("x", &sub).unwrap();
        emitter.add_subscriber("y", &sub).unwrap();
        emitter.add_subscriber("x", &sub).unwrap();

        emitter.fire_event("x", 1).unwrap();
        emitter.stop().unwrap();
        emitter.join().unwrap();

        assert!(sub.is_stopped());
        assert!(emitter.is_stopped());
        // Registered twice for "x", so delivered twice.
        assert_eq!(sub.handled_events(), 2);
    }

    #[test]
    fn operations_after_stop_are_closed() {
        let emitter = Emitter::<u32>::new(["x"]).unwrap();
        let sub = Subscriber::new(|_: u32| {}).unwrap();
        emitter.stop_with_reason("maintenance").unwrap();
        emitter.join().unwrap();

        assert!(emitter.fire_event("x", 1).unwrap_err().is_closed());
        assert!(emitter.add_subscriber("x", &sub).unwrap_err().is_closed());
        assert!(emitter.stop().unwrap_err().is_closed());
        // Vocabulary errors still win over closed.
        assert!(emitter.fire_event("nope", 1).unwrap_err().is_configuration());
    }

    #[test]
    fn dropping_every_handle_stops_subscribers() {
        let emitter = Emitter::<u32>::new(["x"]).unwrap();
        let sub = Subscriber::new(|_: u32| {}).unwrap();
        emitter.add_subscriber("x", &sub).unwrap();

        let state = Arc::clone(&emitter.state);
        drop(emitter);
        state.worker.join(ACTOR).unwrap();

        assert!(state.stopped.load(Ordering::Acquire));
        assert!(sub.is_stopped());
    }

    #[test]
    fn handler_firing_into_stopping_emitter_does_not_deadlock() {
        let emitter = Emitter::<u32>::new(["x", "y"]).unwrap();
        let (entered_tx, entered_rx) = bounded::<()>(0);

        let inner = emitter.clone();
        let sub = Subscriber::new(move |_: u32| {
            let _ = entered_tx.send(());
            // Rendezvous with the emitter worker, which is busy stopping.
            let _ = inner.fire_event("y", 0);
        })
        .unwrap();
        emitter.add_subscriber("x", &sub).unwrap();

        emitter.fire_event("x", 1).unwrap();
        entered_rx.recv().unwrap();
        emitter.stop().unwrap();
        emitter.join().unwrap();

        assert!(sub.is_stopped());
    }

    #[test]
    fn concurrent_callers_all_get_delivered() {
        let total = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&total);
        let emitter = Emitter::new(["tick"]).unwrap();
        let sub = Subscriber::new(move |p: u32| *sink.lock().unwrap() += p).unwrap();
        emitter.add_subscriber("tick", &sub).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let emitter = emitter.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        emitter.fire_event("tick", 1).unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        emitter.stop().unwrap();
        emitter.join().unwrap();
        assert_eq!(*total.lock().unwrap(), 100);
        assert_eq!(emitter.dispatched_events(), 100);
    }
}
