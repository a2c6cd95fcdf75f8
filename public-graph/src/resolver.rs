//! The operations behind the client-facing surface.
//!
//! Most operations are pass-through: they wrap their arguments in one
//! [`Message`] keyed by the session and submit it. The payload pipeline,
//! session initialization and the backend error fan-out live in their own
//! modules as further `impl PublicGraph` blocks.

use crate::encode::{ChunkEncoder, JsonChunkEncoder};
use crate::errors::Result;
use crate::metrics_defs::{MESSAGES_SUBMITTED, SUBMIT_FAILURES};
use crate::project::ProjectDirectory;
use crate::protocol::{
    AddSessionFeedbackRequest, AddSessionPropertiesRequest, IdentifySessionRequest,
    PushMetricsRequest, PushPayloadCompressedRequest,
};
use crate::store::SessionStore;
use indexmap::IndexMap;
use queue::message::{
    AddSessionFeedbackArgs, AddSessionPropertiesArgs, IdentifySessionArgs, PushMetricsArgs,
    PushPayloadCompressedArgs,
};
use queue::model::MetricInput;
use queue::{Message, Producer, ProducerError};
use shared::counter;
use std::sync::Arc;

pub struct PublicGraph {
    pub(crate) producer: Arc<dyn Producer>,
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) projects: ProjectDirectory,
    pub(crate) encoder: Arc<dyn ChunkEncoder>,
}

impl PublicGraph {
    pub fn new(
        producer: Arc<dyn Producer>,
        store: Arc<dyn SessionStore>,
        projects: ProjectDirectory,
    ) -> Self {
        Self::with_encoder(producer, store, projects, Arc::new(JsonChunkEncoder))
    }

    pub fn with_encoder(
        producer: Arc<dyn Producer>,
        store: Arc<dyn SessionStore>,
        projects: ProjectDirectory,
        encoder: Arc<dyn ChunkEncoder>,
    ) -> Self {
        Self {
            producer,
            store,
            projects,
            encoder,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.producer.is_ready()
    }

    /// Hands one batch to the producer, keeping the submission counters.
    pub(crate) async fn submit(
        &self,
        key: &str,
        messages: Vec<Message>,
    ) -> std::result::Result<(), ProducerError> {
        let Some(kind) = messages.first().map(Message::kind) else {
            return Ok(());
        };
        let count = messages.len() as u64;

        match self.producer.submit(key, messages).await {
            Ok(()) => {
                counter!(MESSAGES_SUBMITTED, "kind" => kind).increment(count);
                Ok(())
            }
            Err(e) => {
                counter!(SUBMIT_FAILURES, "kind" => kind).increment(1);
                tracing::error!(routing_key = key, kind, error = %e, "Failed to submit batch");
                Err(e)
            }
        }
    }

    pub async fn identify_session(&self, req: IdentifySessionRequest) -> Result<String> {
        let key = req.session_secure_id.clone();
        let message = Message::IdentifySession(IdentifySessionArgs {
            session_secure_id: req.session_secure_id,
            user_identifier: req.user_identifier,
            user_object: req.user_object,
        });
        self.submit(&key, vec![message]).await?;
        Ok(key)
    }

    pub async fn add_session_properties(&self, req: AddSessionPropertiesRequest) -> Result<String> {
        let key = req.session_secure_id.clone();
        let message = Message::AddSessionProperties(AddSessionPropertiesArgs {
            session_secure_id: req.session_secure_id,
            properties_object: req.properties_object,
        });
        self.submit(&key, vec![message]).await?;
        Ok(key)
    }

    pub async fn push_payload_compressed(&self, req: PushPayloadCompressedRequest) -> Result<()> {
        let key = req.session_secure_id.clone();
        let message = Message::PushPayloadCompressed(PushPayloadCompressedArgs {
            session_secure_id: req.session_secure_id,
            payload_id: req.payload_id,
            data: req.data,
        });
        self.submit(&key, vec![message]).await?;
        Ok(())
    }

    pub async fn add_session_feedback(&self, req: AddSessionFeedbackRequest) -> Result<String> {
        let key = req.session_secure_id.clone();
        let message = Message::AddSessionFeedback(AddSessionFeedbackArgs {
            session_secure_id: req.session_secure_id,
            user_name: req.user_name,
            user_email: req.user_email,
            verbatim: req.verbatim,
            timestamp: req.timestamp,
        });
        self.submit(&key, vec![message]).await?;
        Ok(key)
    }

    /// Submits one message per session the metrics belong to and returns the
    /// number of metrics accepted. Stops at the first failed session.
    pub async fn push_metrics(&self, req: PushMetricsRequest) -> Result<usize> {
        let mut by_session: IndexMap<String, Vec<MetricInput>> = IndexMap::new();
        for metric in req.metrics {
            by_session
                .entry(metric.session_secure_id.clone())
                .or_default()
                .push(metric);
        }

        let mut accepted = 0;
        for (session_secure_id, metrics) in by_session {
            let count = metrics.len();
            let message = Message::PushMetrics(PushMetricsArgs {
                session_secure_id: session_secure_id.clone(),
                metrics,
            });
            self.submit(&session_secure_id, vec![message]).await?;
            accepted += count;
        }

        Ok(accepted)
    }
}
