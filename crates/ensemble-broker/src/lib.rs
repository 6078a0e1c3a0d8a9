//! # Ensemble Broker
//!
//! Outbound client for the broker: catalog registration and top-level task
//! submission. Inbound traffic (the broker calling an agent) is the server
//! crate's concern and never passes through here.

mod client;
mod model;

pub use client::{BrokerClient, BrokerClientConfig, BrokerError};
pub use model::{AgentDefinition, TaskEndpoint, TaskSubmitAck};
