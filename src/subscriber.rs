//! Subscriber actor.
//!
//! A subscriber wraps one [`EventHandler`] and runs it on a dedicated worker
//! thread. Payloads arrive through a notify inbox and termination through a
//! separate stop inbox; the worker selects whichever is ready first and runs
//! the handler to completion before accepting anything else.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::SubscriberConfig;
use crate::error::PubSubResult;
use crate::event::StopSignal;
use crate::handler::EventHandler;
use crate::handoff::{await_ack, handoff};
use crate::worker::{self, panic_message, WorkerSlot};

const ACTOR: &str = "subscriber";

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new random subscriber id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Notification<P> {
    payload: P,
    ack: Option<Sender<()>>,
}

#[derive(Debug, Default)]
struct SubscriberState {
    stopped: AtomicBool,
    handled: AtomicU64,
    worker: WorkerSlot,
}

/// Handle to a running subscriber actor.
///
/// Cloning the handle is cheap; every clone addresses the same worker. The
/// worker exits on `stop`, when its handler panics, or once every handle
/// has been dropped.
pub struct Subscriber<P> {
    id: SubscriberId,
    notify_tx: Sender<Notification<P>>,
    stop_tx: Sender<StopSignal>,
    timeout: Option<Duration>,
    state: Arc<SubscriberState>,
}

impl<P: Send + 'static> Subscriber<P> {
    /// Start a subscriber around `handler` with the default configuration.
    pub fn new<H: EventHandler<P>>(handler: H) -> PubSubResult<Self> {
        Self::with_config(handler, SubscriberConfig::default())
    }

    /// Start a subscriber around `handler`.
    pub fn with_config<H: EventHandler<P>>(handler: H, cfg: SubscriberConfig) -> PubSubResult<Self> {
        let id = SubscriberId::new();
        let (notify_tx, notify_rx) = bounded::<Notification<P>>(cfg.inbox_capacity);
        let (stop_tx, stop_rx) = bounded::<StopSignal>(0);
        let state = Arc::new(SubscriberState::default());

        let thread_state = Arc::clone(&state);
        let name = format!("{}-{}", cfg.thread_name, &id.0.simple().to_string()[..8]);
        let handle = worker::spawn(name, ACTOR, move || {
            worker_loop(id, handler, &thread_state, notify_rx, stop_rx);
        })?;
        state.worker.set(handle);

        Ok(Self {
            id,
            notify_tx,
            stop_tx,
            timeout: cfg.handoff_timeout(),
            state,
        })
    }
}

impl<P> Subscriber<P> {
    /// Hand one payload to the worker.
    ///
    /// Returns once the worker has accepted it; the handler may still be
    /// running.
    pub fn notify(&self, payload: P) -> PubSubResult<()> {
        handoff(&self.notify_tx, Notification { payload, ack: None }, self.timeout, ACTOR)
    }

    /// Hand one payload to the worker and wait for the handler to return.
    pub fn deliver(&self, payload: P) -> PubSubResult<()> {
        let (ack_tx, ack_rx) = bounded::<()>(1);
        handoff(
            &self.notify_tx,
            Notification {
                payload,
                ack: Some(ack_tx),
            },
            self.timeout,
            ACTOR,
        )?;
        await_ack(&ack_rx, self.timeout, ACTOR)
    }

    /// Ask the worker to terminate.
    ///
    /// Blocks until the worker accepts the request. Fails with `Closed` if
    /// the worker has already exited.
    pub fn stop(&self, reason: Option<&str>) -> PubSubResult<()> {
        handoff(&self.stop_tx, StopSignal::new(reason), self.timeout, ACTOR)
    }

    /// Wait for the worker thread to exit.
    pub fn join(&self) -> PubSubResult<()> {
        self.state.worker.join(ACTOR)
    }

    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns true once the worker has exited.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::Acquire)
    }

    /// Number of payloads whose handler returned normally.
    #[must_use]
    pub fn handled_events(&self) -> u64 {
        self.state.handled.load(Ordering::Relaxed)
    }
}

impl<P> Clone for Subscriber<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            notify_tx: self.notify_tx.clone(),
            stop_tx: self.stop_tx.clone(),
            timeout: self.timeout,
            state: Arc::clone(&self.state),
        }
    }
}

impl<P> fmt::Debug for Subscriber<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("stopped", &self.is_stopped())
            .field("handled_events", &self.handled_events())
            .finish_non_exhaustive()
    }
}

fn worker_loop<P, H: EventHandler<P>>(
    id: SubscriberId,
    mut handler: H,
    state: &SubscriberState,
    notify_rx: Receiver<Notification<P>>,
    stop_rx: Receiver<StopSignal>,
) {
    debug!("subscriber {} started", id);

    let mut running = true;
    while running {
        select! {
            recv(notify_rx) -> msg => {
                match msg {
                    Ok(notification) => {
                        running = invoke(id, &mut handler, notification, state);
                    }
                    Err(_) => {
                        debug!("subscriber {} released by all handles", id);
                        running = false;
                    }
                }
            }
            recv(stop_rx) -> msg => {
                running = false;
                match msg {
                    Ok(signal) => {
                        // Only non-empty with a buffered inbox.
                        for notification in notify_rx.try_iter() {
                            if !invoke(id, &mut handler, notification, state) {
                                break;
                            }
                        }
                        info!("subscriber {} stopped: {}", id, signal);
                    }
                    Err(_) => {
                        debug!("subscriber {} released by all handles", id);
                    }
                }
            }
        }
    }

    drop(notify_rx);
    drop(stop_rx);
    state.stopped.store(true, Ordering::Release);
}

/// Run the handler for one notification. Returns false if the handler
/// panicked and the worker must terminate.
fn invoke<P, H: EventHandler<P>>(
    id: SubscriberId,
    handler: &mut H,
    notification: Notification<P>,
    state: &SubscriberState,
) -> bool {
    let Notification { payload, ack } = notification;
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(payload))) {
        Ok(()) => {
            state.handled.fetch_add(1, Ordering::Relaxed);
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
            true
        }
        Err(cause) => {
            // Dropping `ack` unsent tells a waiting `deliver` the worker is gone.
            error!(
                "subscriber {} handler panicked, terminating worker: {}",
                id,
                panic_message(&*cause)
            );
            false
        }
    }
}
