//! Worker thread lifecycle shared by both actors.

use std::any::Any;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crate::error::{ExecutionError, PubSubError, PubSubResult};

/// Spawn a named worker thread.
pub(crate) fn spawn<F>(name: String, actor: &str, body: F) -> PubSubResult<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name).spawn(body).map_err(|err| {
        PubSubError::from(ExecutionError::Spawn {
            actor: actor.to_string(),
            message: err.to_string(),
        })
    })
}

/// Join handle shared between every clone of an actor handle.
///
/// The first caller to `join` takes the handle; later callers return
/// immediately.
#[derive(Debug, Default)]
pub(crate) struct WorkerSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerSlot {
    pub(crate) fn set(&self, handle: JoinHandle<()>) {
        if let Ok(mut guard) = self.handle.lock() {
            *guard = Some(handle);
        }
    }

    pub(crate) fn join(&self, actor: &str) -> PubSubResult<()> {
        let handle = {
            let mut guard = self
                .handle
                .lock()
                .map_err(|_| PubSubError::internal(format!("{actor} join state poisoned")))?;
            match guard.take() {
                // A worker joining itself would never return.
                Some(h) if h.thread().id() == thread::current().id() => {
                    *guard = Some(h);
                    return Err(PubSubError::internal(format!("{actor} worker cannot join itself")));
                }
                other => other,
            }
        };

        match handle {
            None => Ok(()),
            Some(h) => h
                .join()
                .map_err(|cause| PubSubError::internal(format!("{actor} worker panicked: {}", panic_message(&*cause)))),
        }
    }
}

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
