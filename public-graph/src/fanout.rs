//! Fan-out of backend-reported errors by owning session.
//!
//! Errors that name a session are submitted under that session's key. Errors
//! without one share a random key that is drawn once per call, which spreads
//! anonymous errors across partitions without minting a key per error.
//! Groups are submitted independently: a failed group is reported back and
//! logged but never stops the others.

use crate::metrics_defs::FANOUT_GROUP_FAILURES;
use crate::protocol::PushBackendPayloadRequest;
use crate::resolver::PublicGraph;
use indexmap::IndexMap;
use queue::message::PushBackendPayloadArgs;
use queue::model::BackendErrorObjectInput;
use queue::{Message, ProducerError};
use shared::counter;
use uuid::Uuid;

/// The messages submitted under one routing key.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorGroup {
    pub routing_key: String,
    pub session_secure_id: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(thiserror::Error, Debug)]
#[error("failed to submit {errors} backend errors under {routing_key}: {source}")]
pub struct GroupSubmitError {
    pub session_secure_id: Option<String>,
    pub routing_key: String,
    pub errors: usize,
    #[source]
    pub source: ProducerError,
}

/// Outcome of one fan-out: how many groups were attempted and which failed.
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub groups: usize,
    pub failed: Vec<GroupSubmitError>,
}

/// Groups errors by session in first-seen order, one message per error.
pub fn group_by_session(
    project_verbose_id: Option<&str>,
    errors: Vec<BackendErrorObjectInput>,
) -> Vec<ErrorGroup> {
    let mut by_session: IndexMap<Option<String>, Vec<BackendErrorObjectInput>> = IndexMap::new();
    for error in errors {
        by_session
            .entry(error.session_secure_id.clone())
            .or_default()
            .push(error);
    }

    let anonymous_key = Uuid::new_v4().to_string();

    by_session
        .into_iter()
        .map(|(session_secure_id, errors)| {
            let routing_key = session_secure_id
                .clone()
                .unwrap_or_else(|| anonymous_key.clone());
            let messages = errors
                .into_iter()
                .map(|error| {
                    Message::PushBackendPayload(PushBackendPayloadArgs {
                        project_verbose_id: project_verbose_id.map(str::to_string),
                        session_secure_id: session_secure_id.clone(),
                        errors: vec![error],
                    })
                })
                .collect();
            ErrorGroup {
                routing_key,
                session_secure_id,
                messages,
            }
        })
        .collect()
}

impl PublicGraph {
    pub async fn push_backend_payload(&self, req: PushBackendPayloadRequest) -> FanOutReport {
        let groups = group_by_session(req.project_id.as_deref(), req.errors);
        let mut report = FanOutReport {
            groups: groups.len(),
            failed: Vec::new(),
        };

        for group in groups {
            let errors = group.messages.len();
            if let Err(source) = self.submit(&group.routing_key, group.messages).await {
                counter!(FANOUT_GROUP_FAILURES).increment(1);
                let failure = GroupSubmitError {
                    session_secure_id: group.session_secure_id,
                    routing_key: group.routing_key,
                    errors,
                    source,
                };
                tracing::error!(
                    project_id = ?req.project_id,
                    secure_id = ?failure.session_secure_id,
                    error = %failure,
                    "Failed to submit backend errors"
                );
                report.failed.push(failure);
            }
        }

        report
    }
}
