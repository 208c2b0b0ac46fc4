//! Event names, the closed vocabulary and in-flight event values.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigurationError, PubSubError, PubSubResult};

/// Identifier of one event type.
///
/// Names are interned behind an `Arc<str>` so the registry and in-flight
/// events can share them without reallocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Arc<str>);

impl EventName {
    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of event names an emitter accepts.
///
/// Fixed at construction; every name later fired or subscribed to must be
/// a member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    names: HashSet<EventName>,
}

impl Vocabulary {
    /// Build a vocabulary from a list of names.
    ///
    /// Duplicate names collapse into one entry. Empty names are rejected.
    pub fn new<I, S>(names: I) -> PubSubResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(ConfigurationError::EmptyEventName.into());
            }
            set.insert(EventName(Arc::from(name)));
        }
        Ok(Self { names: set })
    }

    /// Returns true if `name` belongs to the vocabulary.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Look up the interned name, failing with a configuration error if it
    /// is not a member.
    pub fn resolve(&self, name: &str) -> PubSubResult<EventName> {
        self.names.get(name).cloned().ok_or_else(|| {
            PubSubError::from(ConfigurationError::UnknownEvent {
                name: name.to_string(),
            })
        })
    }

    /// Number of distinct event names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no event names were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the declared names in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &EventName> {
        self.names.iter()
    }
}

/// An event in transit from a caller to the emitter worker.
#[derive(Debug, Clone)]
pub struct FiredEvent<P> {
    name: EventName,
    payload: P,
}

impl<P> FiredEvent<P> {
    pub(crate) fn new(name: EventName, payload: P) -> Self {
        Self { name, payload }
    }

    /// Name the event was fired under.
    #[must_use]
    pub fn name(&self) -> &EventName {
        &self.name
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Split the event into its name and payload.
    pub fn into_parts(self) -> (EventName, P) {
        (self.name, self.payload)
    }
}

/// Request for an actor to terminate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSignal {
    message: Option<String>,
}

impl StopSignal {
    /// A stop signal carrying an optional message.
    #[must_use]
    pub fn new(message: Option<&str>) -> Self {
        Self {
            message: message.map(str::to_string),
        }
    }

    /// The message attached to the signal, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("no reason given"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_collapses_duplicates() {
        let vocab = Vocabulary::new(["order.created", "order.created", "ping"]).unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(vocab.contains("order.created"));
        assert!(vocab.contains("ping"));
        assert!(!vocab.contains("pong"));
    }

    #[test]
    fn vocabulary_rejects_empty_name() {
        let err = Vocabulary::new(["ok", ""]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn resolve_returns_interned_name() {
        let vocab = Vocabulary::new(vec!["ping".to_string()]).unwrap();
        let a = vocab.resolve("ping").unwrap();
        let b = vocab.resolve("ping").unwrap();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a.as_str(), "ping");
    }

    #[test]
    fn resolve_unknown_is_configuration_error() {
        let vocab = Vocabulary::new(["ping"]).unwrap();
        let err = vocab.resolve("unknown.event").unwrap_err();
        assert!(err.is_configuration());
        assert!(format!("{err}").contains("unknown.event"));
    }

    #[test]
    fn empty_vocabulary_is_allowed() {
        let vocab = Vocabulary::new(Vec::<String>::new()).unwrap();
        assert!(vocab.is_empty());
        assert_eq!(vocab.iter().count(), 0);
    }

    #[test]
    fn stop_signal_display() {
        assert_eq!(StopSignal::new(Some("bye")).to_string(), "bye");
        assert_eq!(StopSignal::default().to_string(), "no reason given");
        assert_eq!(StopSignal::new(None).message(), None);
    }
}
