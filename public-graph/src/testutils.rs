use crate::chunk::Chunk;
use crate::encode::{ChunkEncoder, EncodedChunk, JsonChunkEncoder};
use crate::errors::{PublicGraphError, Result};
use crate::project::{ProjectDirectory, ProjectsConfig};
use crate::resolver::PublicGraph;
use crate::store::{MemoryStore, ProductType, SessionStore, StoreError};
use async_trait::async_trait;
use queue::memory::SubmittedBatch;
use queue::{Message, Producer, ProducerError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records accepted batches and fails submissions for selected keys.
#[derive(Default)]
pub struct RecordingProducer {
    failing_keys: HashSet<String>,
    batches: Mutex<Vec<SubmittedBatch>>,
    attempts: AtomicUsize,
}

impl RecordingProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_keys(keys: &[&str]) -> Self {
        Self {
            failing_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Batches that were accepted, in submission order.
    pub fn batches(&self) -> Vec<SubmittedBatch> {
        self.batches.lock().unwrap().clone()
    }

    /// Number of submit calls, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Producer for RecordingProducer {
    async fn submit(&self, key: &str, messages: Vec<Message>) -> Result<(), ProducerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.contains(key) {
            return Err(ProducerError::Unavailable(format!("forced failure for {key}")));
        }
        self.batches.lock().unwrap().push(SubmittedBatch {
            key: key.to_string(),
            messages,
        });
        Ok(())
    }
}

/// Encodes like [`JsonChunkEncoder`] but fails on one chunk index.
pub struct FailingEncoder {
    fail_at: usize,
    attempts: AtomicUsize,
}

impl FailingEncoder {
    pub fn at_index(fail_at: usize) -> Self {
        Self {
            fail_at,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ChunkEncoder for FailingEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<EncodedChunk> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if chunk.index == self.fail_at {
            return Err(PublicGraphError::Serialization {
                index: chunk.index,
                source: <serde_json::Error as serde::ser::Error>::custom("forced failure"),
            });
        }
        JsonChunkEncoder.encode(chunk)
    }
}

/// A store whose pending flag or quota lookup always fails.
pub struct FailingStore {
    fail_pending: bool,
    fail_quota: bool,
}

impl FailingStore {
    pub fn pending_fails() -> Self {
        Self {
            fail_pending: true,
            fail_quota: false,
        }
    }

    pub fn quota_fails() -> Self {
        Self {
            fail_pending: false,
            fail_quota: true,
        }
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn set_pending_session(&self, _secure_id: &str, _pending: bool) -> Result<(), StoreError> {
        if self.fail_pending {
            return Err(StoreError::Unavailable("forced failure".into()));
        }
        Ok(())
    }

    async fn is_billing_quota_exceeded(
        &self,
        _project_id: i32,
        _product: ProductType,
    ) -> Result<bool, StoreError> {
        if self.fail_quota {
            return Err(StoreError::Unavailable("forced failure".into()));
        }
        Ok(false)
    }
}

/// Resolves decimal ids and hashids with an empty salt.
pub fn default_projects() -> ProjectDirectory {
    ProjectDirectory::new(&ProjectsConfig::default()).unwrap()
}

pub fn graph_with(producer: Arc<dyn Producer>) -> PublicGraph {
    graph_with_encoder(producer, Arc::new(JsonChunkEncoder))
}

pub fn graph_with_encoder(producer: Arc<dyn Producer>, encoder: Arc<dyn ChunkEncoder>) -> PublicGraph {
    PublicGraph::with_encoder(
        producer,
        Arc::new(MemoryStore::new(Duration::from_secs(60))),
        default_projects(),
        encoder,
    )
}

pub fn graph_with_store(
    producer: Arc<dyn Producer>,
    store: Arc<dyn SessionStore>,
    projects: ProjectDirectory,
) -> PublicGraph {
    PublicGraph::new(producer, store, projects)
}
