use crate::memory::MemoryProducer;
use crate::producer::{Producer, ProducerError};
use crate::rest::KafkaRestProducer;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn default_timeout_secs() -> u64 {
    10
}

/// Which broker the edge submits to.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProducerConfig {
    KafkaRest {
        url: Url,
        topic: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Memory,
}

impl ProducerConfig {
    pub fn build(&self) -> Result<Arc<dyn Producer>, ProducerError> {
        match self {
            ProducerConfig::KafkaRest {
                url,
                topic,
                timeout_secs,
            } => {
                tracing::info!(url = %url, topic, "Using Kafka REST producer");
                Ok(Arc::new(KafkaRestProducer::new(
                    url,
                    topic,
                    Duration::from_secs(*timeout_secs),
                )?))
            }
            ProducerConfig::Memory => {
                tracing::warn!(
                    "Using the in-memory producer. Submitted messages are never delivered."
                );
                Ok(Arc::new(MemoryProducer::new()))
            }
        }
    }
}
