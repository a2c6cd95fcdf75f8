//! Deletion of one batch of sessions scheduled by a cleanup task.
//!
//! A batch is resolved to its session ids, then the dependent field rows are
//! deleted, then the sessions themselves. The batch token is returned
//! unchanged so an orchestrator can chain the next step.
//!
//! This crate is a library. It ships no binary or `edge` subcommand: the
//! orchestrator that schedules batches embeds [`delete_session_batch`] and
//! supplies a [`SessionBatchStore`] over its database.

pub mod metrics_defs;
pub mod store;

use metrics_defs::{BATCH_FAILURES, SESSION_FIELDS_DELETED, SESSIONS_DELETED};
use serde::{Deserialize, Serialize};
use shared::counter;
use store::{BoxError, SessionBatchStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIdResponse {
    pub task_id: String,
    pub batch_id: String,
}

#[derive(thiserror::Error, Debug)]
pub enum CleanupError {
    #[error("error getting session ids to delete: {0}")]
    Lookup(#[source] BoxError),
    #[error("error deleting session fields: {0}")]
    DeleteSessionFields(#[source] BoxError),
    #[error("error deleting sessions: {0}")]
    DeleteSessions(#[source] BoxError),
}

impl CleanupError {
    fn stage(&self) -> &'static str {
        match self {
            CleanupError::Lookup(_) => "lookup",
            CleanupError::DeleteSessionFields(_) => "delete_session_fields",
            CleanupError::DeleteSessions(_) => "delete_sessions",
        }
    }
}

pub async fn delete_session_batch(
    store: &dyn SessionBatchStore,
    event: BatchIdResponse,
) -> Result<BatchIdResponse, CleanupError> {
    let result = run_batch(store, &event).await;
    if let Err(e) = &result {
        counter!(BATCH_FAILURES, "stage" => e.stage()).increment(1);
        tracing::error!(
            task_id = %event.task_id,
            batch_id = %event.batch_id,
            error = %e,
            "Session batch cleanup failed"
        );
    }
    result.map(|()| event)
}

async fn run_batch(
    store: &dyn SessionBatchStore,
    event: &BatchIdResponse,
) -> Result<(), CleanupError> {
    let session_ids = store
        .session_ids_in_batch(&event.task_id, &event.batch_id)
        .await
        .map_err(CleanupError::Lookup)?;

    let fields = store
        .delete_session_fields(&session_ids)
        .await
        .map_err(CleanupError::DeleteSessionFields)?;
    counter!(SESSION_FIELDS_DELETED).increment(fields);

    let sessions = store
        .delete_sessions(&session_ids)
        .await
        .map_err(CleanupError::DeleteSessions)?;
    counter!(SESSIONS_DELETED).increment(sessions);

    tracing::info!(
        task_id = %event.task_id,
        batch_id = %event.batch_id,
        sessions,
        fields,
        "Deleted session batch"
    );
    Ok(())
}
