use crate::message::Message;
use crate::producer::{Producer, ProducerError};
use async_trait::async_trait;
use std::sync::Mutex;

/// A batch as it was handed to [`MemoryProducer::submit`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubmittedBatch {
    pub key: String,
    pub messages: Vec<Message>,
}

/// Keeps submitted batches in process.
///
/// Used for local development without a broker; nothing is ever consumed.
#[derive(Default)]
pub struct MemoryProducer {
    batches: Mutex<Vec<SubmittedBatch>>,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every batch submitted so far, in submission order.
    pub fn batches(&self) -> Vec<SubmittedBatch> {
        self.batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Producer for MemoryProducer {
    async fn submit(&self, key: &str, messages: Vec<Message>) -> Result<(), ProducerError> {
        tracing::debug!(key, records = messages.len(), "Buffered batch in memory");
        self.batches
            .lock()
            .map_err(|_| ProducerError::Unavailable("memory producer poisoned".into()))?
            .push(SubmittedBatch {
                key: key.to_string(),
                messages,
            });
        Ok(())
    }
}
