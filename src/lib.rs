//! # kyro-pubsub - in-process publish/subscribe actors
//!
//! An [`Emitter`] accepts a fixed vocabulary of event names and fans fired
//! events out to the [`Subscriber`]s registered for each name. Every actor
//! runs on its own worker thread and is reached only through rendezvous
//! channels, so the subscription registry is owned by a single thread and
//! needs no locks.
//!
//! ## Core Concepts
//!
//! - **Emitter**: owns the vocabulary and the registry; serializes fire,
//!   subscribe and stop requests through its worker
//! - **Subscriber**: wraps one [`EventHandler`] and runs it sequentially
//! - **Vocabulary**: the closed set of legal event names
//! - **Hand-off**: a blocking transfer of one message to an actor's worker
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kyro_pubsub::{Emitter, Subscriber};
//!
//! let emitter = Emitter::new(["order.created"])?;
//! let audit = Subscriber::new(|order: String| println!("created {order}"))?;
//! emitter.add_subscriber("order.created", &audit)?;
//!
//! emitter.fire_event("order.created", "ORD-1".to_string())?;
//!
//! // Stops and joins every registered subscriber.
//! emitter.stop()?;
//! emitter.join()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod event;
pub mod handler;
pub mod subscriber;

mod handoff;
mod worker;

// Re-export primary types at crate root for convenience
pub use config::{Delivery, EmitterConfig, SubscriberConfig};
pub use emitter::Emitter;
pub use error::{ConfigurationError, ExecutionError, PubSubError, PubSubResult};
pub use event::{EventName, FiredEvent, StopSignal, Vocabulary};
pub use handler::EventHandler;
pub use subscriber::{Subscriber, SubscriberId};
