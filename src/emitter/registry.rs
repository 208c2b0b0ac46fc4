//! Subscription registry owned by the emitter worker.

use std::collections::{HashMap, HashSet};

use crate::event::EventName;
use crate::subscriber::{Subscriber, SubscriberId};

/// Event name to ordered subscriber list.
///
/// Only the emitter worker holds one, so it needs no locking. Registration
/// order is delivery order. `members` lists every distinct subscriber once,
/// in first-registration order, for the stop fan-out.
pub(crate) struct SubscriptionRegistry<P> {
    by_event: HashMap<EventName, Vec<Subscriber<P>>>,
    members: Vec<Subscriber<P>>,
    seen: HashSet<SubscriberId>,
}

impl<P> SubscriptionRegistry<P> {
    pub(crate) fn new() -> Self {
        Self {
            by_event: HashMap::new(),
            members: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub(crate) fn register(&mut self, event: EventName, subscriber: Subscriber<P>) {
        if self.seen.insert(subscriber.id()) {
            self.members.push(subscriber.clone());
        }
        self.by_event.entry(event).or_default().push(subscriber);
    }

    pub(crate) fn subscribers_for(&self, event: &str) -> &[Subscriber<P>] {
        self.by_event.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    /// Consume the registry, yielding each distinct subscriber once.
    pub(crate) fn into_members(self) -> Vec<Subscriber<P>> {
        self.members
    }
}
