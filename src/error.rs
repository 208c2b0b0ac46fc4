//! Error types for kyro-pubsub.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition. Misuse of the event vocabulary is reported as a
//! [`ConfigurationError`]; failures to reach an actor are reported as an
//! [`ExecutionError`].

use thiserror::Error;

/// Errors caused by misconfiguration of the event vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Event '{name}' is not part of the emitter vocabulary")]
    UnknownEvent {
        name: String,
    },

    #[error("Event name cannot be empty")]
    EmptyEventName,
}

/// Errors raised while handing a message to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("The {actor} has stopped and no longer accepts messages")]
    Closed {
        actor: String,
    },

    #[error("Hand-off to the {actor} timed out after {duration_ms}ms")]
    Timeout {
        actor: String,
        duration_ms: u64,
    },

    #[error("Failed to spawn {actor} worker: {message}")]
    Spawn {
        actor: String,
        message: String,
    },
}

impl ExecutionError {
    pub(crate) fn closed(actor: &str) -> Self {
        Self::Closed {
            actor: actor.to_string(),
        }
    }
}

/// Top-level error type for kyro-pubsub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PubSubError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl PubSubError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if the target actor has stopped.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Closed { .. }))
    }

    /// Returns true if a hand-off timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Timeout { .. }))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for kyro-pubsub operations.
pub type PubSubResult<T> = Result<T, PubSubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_event_message() {
        let err = ConfigurationError::UnknownEvent {
            name: "unknown.event".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("unknown.event"));
        assert!(msg.contains("vocabulary"));
    }

    #[test]
    fn test_timeout_message() {
        let err = ExecutionError::Timeout {
            actor: "subscriber".to_string(),
            duration_ms: 250,
        };
        let msg = format!("{err}");
        assert!(msg.contains("subscriber"));
        assert!(msg.contains("250ms"));
    }

    #[test]
    fn test_pubsub_error_from_configuration() {
        let err: PubSubError = ConfigurationError::EmptyEventName.into();
        assert!(err.is_configuration());
        assert!(!err.is_closed());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_pubsub_error_from_execution() {
        let closed: PubSubError = ExecutionError::closed("emitter").into();
        assert!(closed.is_closed());
        assert!(!closed.is_configuration());
        assert!(format!("{closed}").contains("emitter has stopped"));

        let timeout: PubSubError = ExecutionError::Timeout {
            actor: "emitter".to_string(),
            duration_ms: 10,
        }
        .into();
        assert!(timeout.is_timeout());
        assert!(!timeout.is_closed());
    }

    #[test]
    fn test_pubsub_error_internal() {
        let err = PubSubError::internal("worker panicked");
        assert!(err.is_internal());
        assert!(format!("{err}").contains("worker panicked"));
    }
}
