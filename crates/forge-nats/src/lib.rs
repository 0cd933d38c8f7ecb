#![forbid(unsafe_code)]

//! NATS JetStream backend for the Event Sink external collaborator
//! (component C2, §6). Publishes every `forge_core::events::Event` to a
//! single `FORGE_EVENTS` stream, fire-and-forget, never propagating a
//! publish failure back into the control plane.

mod client;
mod config;
mod error;
mod sink;

pub use client::NatsClient;
pub use config::NatsConfig;
pub use error::{Error, Result};
pub use sink::NatsEventSink;
