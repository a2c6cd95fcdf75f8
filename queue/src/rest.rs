//! Producer speaking the Kafka REST proxy protocol (v2, JSON embedded format).
//!
//! One `submit` call becomes one `POST /topics/<topic>` carrying every record
//! of the batch. Records sharing a key are hashed to the same partition by
//! the proxy and appended in request order.

use crate::message::Message;
use crate::metrics_defs::{BROKER_REQUEST_DURATION, BROKER_REQUEST_RECORDS};
use crate::producer::{Producer, ProducerError};
use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use shared::histogram;
use std::time::{Duration, Instant};
use url::Url;

const CONTENT_TYPE_JSON_V2: &str = "application/vnd.kafka.json.v2+json";
const ACCEPT_V2: &str = "application/vnd.kafka.v2+json";

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: Vec<Record<'a>>,
}

#[derive(Serialize)]
struct Record<'a> {
    key: &'a str,
    value: &'a Message,
}

#[derive(Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<RecordOffset>,
}

#[derive(Deserialize)]
struct RecordOffset {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

pub struct KafkaRestProducer {
    client: reqwest::Client,
    endpoint: Url,
}

impl KafkaRestProducer {
    pub fn new(base_url: &Url, topic: &str, timeout: Duration) -> Result<Self, ProducerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let mut endpoint = base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| ProducerError::Unavailable(format!("invalid base url: {base_url}")))?
            .pop_if_empty()
            .push("topics")
            .push(topic);

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Producer for KafkaRestProducer {
    async fn submit(&self, key: &str, messages: Vec<Message>) -> Result<(), ProducerError> {
        let total = messages.len();
        let request = ProduceRequest {
            records: messages
                .iter()
                .map(|value| Record { key, value })
                .collect(),
        };
        let body = serde_json::to_vec(&request)?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_V2)
            .header(ACCEPT, ACCEPT_V2)
            .body(body)
            .send()
            .await;
        histogram!(BROKER_REQUEST_DURATION).record(start.elapsed().as_secs_f64());
        histogram!(BROKER_REQUEST_RECORDS).record(total as f64);

        let response = response?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProducerError::Status { status, body });
        }

        let produced: ProduceResponse = response.json().await?;
        let failures: Vec<&RecordOffset> = produced
            .offsets
            .iter()
            .filter(|offset| offset.error_code.is_some())
            .collect();

        if let Some(first) = failures.first() {
            return Err(ProducerError::Rejected {
                rejected: failures.len(),
                total,
                reason: first.error.clone().unwrap_or_default(),
            });
        }

        tracing::debug!(key, records = total, "Submitted batch to broker");
        Ok(())
    }
}
