//! Turns assembled chunks into the outbound push batch.
//!
//! The whole batch is built before anything reaches the producer: a failure
//! on any chunk discards the batch, so a payload is either submitted in full
//! or not at all.

use crate::chunk::Chunk;
use crate::errors::{PublicGraphError, Result};
use crate::parse::{ConsoleMessages, Resources, WebSocketEvents};
use queue::Message;
use queue::message::PushPayloadArgs;
use queue::model::ReplayEventsInput;
use serde::Serialize;

/// Wire text of one chunk's sub-payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedChunk {
    pub messages: String,
    pub resources: String,
    pub web_socket_events: Option<String>,
}

/// Re-encodes the textual sub-payloads of a chunk.
pub trait ChunkEncoder: Send + Sync {
    fn encode(&self, chunk: &Chunk) -> Result<EncodedChunk>;
}

/// Encodes each sub-payload back into the same JSON envelope it arrived in.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonChunkEncoder;

fn to_json<T: Serialize>(index: usize, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| PublicGraphError::Serialization { index, source })
}

impl ChunkEncoder for JsonChunkEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<EncodedChunk> {
        let messages = to_json(
            chunk.index,
            &ConsoleMessages {
                messages: chunk.log_rows.as_slice(),
            },
        )?;
        let resources = to_json(
            chunk.index,
            &Resources {
                resources: chunk.resources.as_slice(),
            },
        )?;
        let web_socket_events = chunk
            .web_socket_events
            .as_deref()
            .map(|events| {
                to_json(
                    chunk.index,
                    &WebSocketEvents {
                        web_socket_events: events,
                    },
                )
            })
            .transpose()?;

        Ok(EncodedChunk {
            messages,
            resources,
            web_socket_events,
        })
    }
}

/// Fields shared by every chunk of one push.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PayloadContext {
    pub session_secure_id: String,
    pub payload_id: i64,
    pub is_beacon: Option<bool>,
    pub has_session_unloaded: Option<bool>,
    pub highlight_logs: Option<String>,
}

/// A batch ready to be handed to the producer in one call.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutedBatch {
    pub key: String,
    pub messages: Vec<Message>,
}

/// Builds one `PushPayload` message per chunk, in chunk order, all keyed by
/// the session so the broker keeps them on one partition.
pub fn route_chunks(
    context: &PayloadContext,
    chunks: Vec<Chunk>,
    encoder: &dyn ChunkEncoder,
) -> Result<RoutedBatch> {
    let messages = chunks
        .into_iter()
        .map(|chunk| {
            let encoded = encoder.encode(&chunk)?;
            Ok(Message::PushPayload(PushPayloadArgs {
                session_secure_id: context.session_secure_id.clone(),
                events: ReplayEventsInput {
                    events: chunk.events,
                },
                messages: encoded.messages,
                resources: encoded.resources,
                web_socket_events: encoded.web_socket_events,
                errors: chunk.errors,
                is_beacon: context.is_beacon,
                has_session_unloaded: context.has_session_unloaded,
                highlight_logs: context.highlight_logs.clone(),
                payload_id: context.payload_id,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RoutedBatch {
        key: context.session_secure_id.clone(),
        messages,
    })
}
