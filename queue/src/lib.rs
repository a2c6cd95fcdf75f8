//! Outbound side of the ingestion edge.
//!
//! Everything accepted by the public graph leaves the process as a batch of
//! [`Message`]s submitted under a routing key. The broker guarantees that
//! messages sharing a key land on the same partition in submission order, and
//! delivers them at least once.

pub mod config;
pub mod memory;
pub mod message;
pub mod metrics_defs;
pub mod model;
pub mod producer;
pub mod rest;

pub use config::ProducerConfig;
pub use memory::MemoryProducer;
pub use message::Message;
pub use producer::{Producer, ProducerError};
pub use rest::KafkaRestProducer;
