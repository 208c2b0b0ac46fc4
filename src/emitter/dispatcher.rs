//! Emitter dispatcher worker.
//!
//! The worker owns the subscription registry outright. Fire, subscribe and
//! stop requests reach it through separate inboxes and are handled one at a
//! time, so every registry read and write happens on this thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{select, Receiver};
use tracing::{debug, info, warn};

use crate::config::Delivery;
use crate::event::{EventName, FiredEvent, StopSignal};
use crate::subscriber::Subscriber;
use crate::worker::WorkerSlot;

use super::registry::SubscriptionRegistry;

const DROPPED: &str = "emitter dropped";
const STOPPED: &str = "emitter stopped";

pub(crate) struct SubscribeRequest<P> {
    pub event: EventName,
    pub subscriber: Subscriber<P>,
}

/// Receiving ends of the emitter's inboxes.
pub(crate) struct Inboxes<P> {
    pub fire_rx: Receiver<FiredEvent<P>>,
    pub subscribe_rx: Receiver<SubscribeRequest<P>>,
    pub stop_rx: Receiver<StopSignal>,
}

#[derive(Debug, Default)]
pub(crate) struct EmitterState {
    pub stopped: AtomicBool,
    pub dispatched: AtomicU64,
    pub worker: WorkerSlot,
}

pub(crate) fn worker_loop<P: Clone + Send + 'static>(delivery: Delivery, inboxes: Inboxes<P>, state: &EmitterState) {
    let mut registry = SubscriptionRegistry::new();
    let mut stop: Option<StopSignal> = None;

    debug!("emitter started");

    while stop.is_none() {
        select! {
            recv(inboxes.fire_rx) -> msg => {
                match msg {
                    Ok(event) => dispatch(&registry, event, delivery, state),
                    Err(_) => stop = Some(StopSignal::new(Some(DROPPED))),
                }
            }
            recv(inboxes.subscribe_rx) -> msg => {
                match msg {
                    Ok(SubscribeRequest { event, subscriber }) => {
                        debug!("subscriber {} registered for {}", subscriber.id(), event);
                        registry.register(event, subscriber);
                    }
                    Err(_) => stop = Some(StopSignal::new(Some(DROPPED))),
                }
            }
            recv(inboxes.stop_rx) -> msg => {
                stop = Some(msg.unwrap_or_else(|_| StopSignal::new(Some(DROPPED))));
            }
        }
    }

    let signal = stop.unwrap_or_default();
    shutdown(registry, inboxes, &signal, delivery, state);
}

/// Forward one event to every subscriber registered for it, in
/// registration order.
fn dispatch<P: Clone>(registry: &SubscriptionRegistry<P>, event: FiredEvent<P>, delivery: Delivery, state: &EmitterState) {
    let (name, payload) = event.into_parts();
    let subscribers = registry.subscribers_for(name.as_str());
    if subscribers.is_empty() {
        debug!("event {} fired with no subscribers", name);
    }

    for subscriber in subscribers {
        let outcome = match delivery {
            Delivery::Handoff => subscriber.notify(payload.clone()),
            Delivery::Completion => subscriber.deliver(payload.clone()),
        };
        if let Err(err) = outcome {
            warn!("event {} not delivered to subscriber {}: {}", name, subscriber.id(), err);
        }
    }

    state.dispatched.fetch_add(1, Ordering::Relaxed);
}

fn shutdown<P: Clone>(
    mut registry: SubscriptionRegistry<P>,
    inboxes: Inboxes<P>,
    signal: &StopSignal,
    delivery: Delivery,
    state: &EmitterState,
) {
    info!("stopping emitter: {}", signal);

    // Pick up callers already blocked in a hand-off and anything buffered
    // in the fire inbox.
    for SubscribeRequest { event, subscriber } in inboxes.subscribe_rx.try_iter() {
        registry.register(event, subscriber);
    }
    for event in inboxes.fire_rx.try_iter() {
        dispatch(&registry, event, delivery, state);
    }

    // Inboxes go before subscribers are stopped, so a handler blocked firing
    // into this emitter gets `Closed` and can return.
    drop(inboxes);

    let reason = signal.message().unwrap_or(STOPPED);
    for subscriber in registry.into_members() {
        match subscriber.stop(Some(reason)) {
            Ok(()) => {}
            Err(err) if err.is_closed() => {
                debug!("subscriber {} already stopped", subscriber.id());
            }
            Err(err) => {
                warn!("subscriber {} did not accept stop: {}", subscriber.id(), err);
                continue;
            }
        }
        if let Err(err) = subscriber.join() {
            warn!("subscriber {} worker failed: {}", subscriber.id(), err);
        }
    }

    state.stopped.store(true, Ordering::Release);
    info!("emitter stopped");
}
