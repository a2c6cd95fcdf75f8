use crate::message::Message;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum ProducerError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("broker request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("broker responded with status {status}: {body}")]
    Status { status: http::StatusCode, body: String },
    #[error("broker rejected {rejected} of {total} records: {reason}")]
    Rejected {
        rejected: usize,
        total: usize,
        reason: String,
    },
    #[error("producer unavailable: {0}")]
    Unavailable(String),
}

/// Batched, keyed submission to the partitioned log.
///
/// All messages of one call share `key` and must be appended to the same
/// partition in the given order. Delivery is at least once: an `Err` means the
/// outcome is unknown and the whole batch may be retried.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn submit(&self, key: &str, messages: Vec<Message>) -> Result<(), ProducerError>;

    fn is_ready(&self) -> bool {
        true
    }
}
