use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Relational storage of sessions scheduled for deletion.
#[async_trait]
pub trait SessionBatchStore: Send + Sync {
    /// Ids of the sessions that make up one batch of a deletion task.
    async fn session_ids_in_batch(
        &self,
        task_id: &str,
        batch_id: &str,
    ) -> Result<Vec<i64>, BoxError>;

    /// Deletes the field rows that reference the given sessions.
    async fn delete_session_fields(&self, session_ids: &[i64]) -> Result<u64, BoxError>;

    async fn delete_sessions(&self, session_ids: &[i64]) -> Result<u64, BoxError>;
}

#[derive(Default)]
struct Tables {
    batches: HashMap<(String, String), Vec<i64>>,
    sessions: HashSet<i64>,
    /// `(session_id, field_id)` rows.
    session_fields: Vec<(i64, i64)>,
}

/// In-memory implementation of [`SessionBatchStore`].
///
/// Deleting a session that still has field rows fails, like a foreign key
/// would.
#[derive(Default)]
pub struct MemorySessionBatchStore {
    tables: RwLock<Tables>,
}

impl MemorySessionBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_session(&self, session_id: i64, field_ids: &[i64]) {
        let mut tables = self.tables.write().await;
        tables.sessions.insert(session_id);
        tables
            .session_fields
            .extend(field_ids.iter().map(|field_id| (session_id, *field_id)));
    }

    pub async fn assign_batch(&self, task_id: &str, batch_id: &str, session_ids: &[i64]) {
        let mut tables = self.tables.write().await;
        tables
            .batches
            .entry((task_id.to_string(), batch_id.to_string()))
            .or_default()
            .extend_from_slice(session_ids);
    }

    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    pub async fn session_field_count(&self) -> usize {
        self.tables.read().await.session_fields.len()
    }
}

#[async_trait]
impl SessionBatchStore for MemorySessionBatchStore {
    async fn session_ids_in_batch(
        &self,
        task_id: &str,
        batch_id: &str,
    ) -> Result<Vec<i64>, BoxError> {
        let tables = self.tables.read().await;
        Ok(tables
            .batches
            .get(&(task_id.to_string(), batch_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_session_fields(&self, session_ids: &[i64]) -> Result<u64, BoxError> {
        let mut tables = self.tables.write().await;
        let before = tables.session_fields.len();
        tables
            .session_fields
            .retain(|(session_id, _)| !session_ids.contains(session_id));
        Ok((before - tables.session_fields.len()) as u64)
    }

    async fn delete_sessions(&self, session_ids: &[i64]) -> Result<u64, BoxError> {
        let mut tables = self.tables.write().await;
        if let Some((session_id, _)) = tables
            .session_fields
            .iter()
            .find(|(session_id, _)| session_ids.contains(session_id))
        {
            return Err(format!("session {session_id} is still referenced by session_fields").into());
        }

        let mut deleted = 0;
        for session_id in session_ids {
            if tables.sessions.remove(session_id) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
