//! Blocking hand-off of one message into an actor inbox.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::error::{ExecutionError, PubSubError, PubSubResult};

/// Send `msg` into `tx`, blocking until the receiving worker accepts it or
/// `timeout` elapses.
///
/// A disconnected inbox means the worker has exited and maps to `Closed`.
pub(crate) fn handoff<T>(tx: &Sender<T>, msg: T, timeout: Option<Duration>, actor: &str) -> PubSubResult<()> {
    match timeout {
        None => tx.send(msg).map_err(|_| PubSubError::from(ExecutionError::closed(actor))),
        Some(timeout) => tx.send_timeout(msg, timeout).map_err(|err| match err {
            SendTimeoutError::Timeout(_) => PubSubError::from(timeout_error(actor, timeout)),
            SendTimeoutError::Disconnected(_) => PubSubError::from(ExecutionError::closed(actor)),
        }),
    }
}

/// Wait for a one-shot acknowledgement from a worker.
///
/// The worker drops the ack sender without sending when it terminates
/// mid-message, which maps to `Closed`.
pub(crate) fn await_ack(rx: &Receiver<()>, timeout: Option<Duration>, actor: &str) -> PubSubResult<()> {
    match timeout {
        None => rx.recv().map_err(|_| PubSubError::from(ExecutionError::closed(actor))),
        Some(timeout) => rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => PubSubError::from(timeout_error(actor, timeout)),
            RecvTimeoutError::Disconnected => PubSubError::from(ExecutionError::closed(actor)),
        }),
    }
}

fn timeout_error(actor: &str, timeout: Duration) -> ExecutionError {
    ExecutionError::Timeout {
        actor: actor.to_string(),
        duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
    }
}
