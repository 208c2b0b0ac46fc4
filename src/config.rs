//! Actor configuration.
//!
//! Defaults reproduce the strict rendezvous semantics: zero-capacity inboxes
//! and no hand-off deadline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How far the emitter's fan-out waits on each subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Wait until the subscriber worker accepts the payload.
    #[default]
    Handoff,
    /// Wait until the subscriber's handler has returned.
    Completion,
}

/// Emitter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Name of the worker thread.
    pub thread_name: String,
    /// Capacity of the fire inbox. `0` is a rendezvous. Registration and
    /// stop requests are always a rendezvous.
    pub inbox_capacity: usize,
    /// Deadline for a caller's hand-off into the emitter. `None` blocks
    /// indefinitely.
    pub handoff_timeout_ms: Option<u64>,
    /// Fan-out delivery mode.
    pub delivery: Delivery,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            thread_name: "kyro-emitter".to_string(),
            inbox_capacity: 0,
            handoff_timeout_ms: None,
            delivery: Delivery::Handoff,
        }
    }
}

impl EmitterConfig {
    /// Hand-off deadline as a `Duration`.
    #[must_use]
    pub fn handoff_timeout(&self) -> Option<Duration> {
        self.handoff_timeout_ms.map(Duration::from_millis)
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Prefix of the worker thread name; the subscriber id is appended.
    pub thread_name: String,
    /// Capacity of the notify inbox. `0` is a rendezvous.
    pub inbox_capacity: usize,
    /// Deadline for each blocking wait on this subscriber: the hand-off in
    /// `notify`, `deliver` and `stop`, and the handler completion `deliver`
    /// waits for.
    pub handoff_timeout_ms: Option<u64>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            thread_name: "kyro-subscriber".to_string(),
            inbox_capacity: 0,
            handoff_timeout_ms: None,
        }
    }
}

impl SubscriberConfig {
    /// Hand-off deadline as a `Duration`.
    #[must_use]
    pub fn handoff_timeout(&self) -> Option<Duration> {
        self.handoff_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_rendezvous_without_deadline() {
        let cfg = EmitterConfig::default();
        assert_eq!(cfg.inbox_capacity, 0);
        assert_eq!(cfg.handoff_timeout(), None);
        assert_eq!(cfg.delivery, Delivery::Handoff);

        let cfg = SubscriberConfig::default();
        assert_eq!(cfg.inbox_capacity, 0);
        assert_eq!(cfg.handoff_timeout(), None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EmitterConfig =
            serde_json::from_str(r#"{ "handoff_timeout_ms": 250, "delivery": "completion" }"#).unwrap();
        assert_eq!(cfg.thread_name, "kyro-emitter");
        assert_eq!(cfg.handoff_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.delivery, Delivery::Completion);

        let cfg: SubscriberConfig = serde_json::from_str(r#"{ "inbox_capacity": 8 }"#).unwrap();
        assert_eq!(cfg.inbox_capacity, 8);
        assert_eq!(cfg.thread_name, "kyro-subscriber");
    }
}
