//! Decoding of the textual sub-payloads of a client push.
//!
//! The console messages, resource timings and websocket events arrive as
//! independently serialized JSON documents. They are decoded concurrently on
//! the blocking pool; the step only succeeds once every decode has finished
//! and none of them failed.

use crate::errors::{PublicGraphError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use tokio::task::JoinSet;

/// Names the textual sub-payload a decode error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubPayload {
    Messages,
    Resources,
    WebSocketEvents,
}

impl SubPayload {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SubPayload::Messages => "messages",
            SubPayload::Resources => "resources",
            SubPayload::WebSocketEvents => "webSocketEvents",
        }
    }
}

impl fmt::Display for SubPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One console message recorded by the browser SDK.
///
/// Only `type` is required; everything else is carried through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// `{"messages": [...]}`
#[derive(Serialize, Deserialize)]
pub(crate) struct ConsoleMessages<C> {
    #[serde(default)]
    pub messages: C,
}

/// `{"resources": [...]}`
#[derive(Serialize, Deserialize)]
pub(crate) struct Resources<C> {
    #[serde(default)]
    pub resources: C,
}

/// `{"webSocketEvents": [...]}`
#[derive(Serialize, Deserialize)]
pub(crate) struct WebSocketEvents<C> {
    #[serde(rename = "webSocketEvents", default)]
    pub web_socket_events: C,
}

/// The undecoded sub-payloads of one push.
#[derive(Clone, Debug, Default)]
pub struct RawSubPayloads {
    pub messages: String,
    pub resources: String,
    pub web_socket_events: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSubPayloads {
    pub log_rows: Vec<LogRow>,
    pub resources: Vec<JsonValue>,
    pub web_socket_events: Vec<JsonValue>,
}

enum Decoded {
    LogRows(Vec<LogRow>),
    Resources(Vec<JsonValue>),
    WebSocketEvents(Vec<JsonValue>),
}

pub fn decode_log_rows(text: &str) -> Result<Vec<LogRow>> {
    serde_json::from_str::<ConsoleMessages<Vec<LogRow>>>(text)
        .map(|decoded| decoded.messages)
        .map_err(|source| PublicGraphError::Decode {
            part: SubPayload::Messages,
            source,
        })
}

pub fn decode_resources(text: &str) -> Result<Vec<JsonValue>> {
    serde_json::from_str::<Resources<Vec<JsonValue>>>(text)
        .map(|decoded| decoded.resources)
        .map_err(|source| PublicGraphError::Decode {
            part: SubPayload::Resources,
            source,
        })
}

pub fn decode_web_socket_events(text: &str) -> Result<Vec<JsonValue>> {
    serde_json::from_str::<WebSocketEvents<Vec<JsonValue>>>(text)
        .map(|decoded| decoded.web_socket_events)
        .map_err(|source| PublicGraphError::Decode {
            part: SubPayload::WebSocketEvents,
            source,
        })
}

/// Decodes all sub-payloads in parallel.
///
/// Every spawned decode is awaited even after a failure; the first error
/// observed is returned and the remaining results are dropped.
pub async fn parse_sub_payloads(raw: RawSubPayloads) -> Result<ParsedSubPayloads> {
    let RawSubPayloads {
        messages,
        resources,
        web_socket_events,
    } = raw;

    let mut join_set = JoinSet::new();
    join_set.spawn_blocking(move || decode_log_rows(&messages).map(Decoded::LogRows));
    join_set.spawn_blocking(move || decode_resources(&resources).map(Decoded::Resources));
    if let Some(web_socket_events) = web_socket_events {
        join_set.spawn_blocking(move || {
            decode_web_socket_events(&web_socket_events).map(Decoded::WebSocketEvents)
        });
    }

    collect_decoded(&mut join_set).await
}

/// Waits for every task in `join_set`, keeping the first error.
async fn collect_decoded(join_set: &mut JoinSet<Result<Decoded>>) -> Result<ParsedSubPayloads> {
    let mut parsed = ParsedSubPayloads::default();
    let mut first_error = None;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(Decoded::LogRows(rows))) => parsed.log_rows = rows,
            Ok(Ok(Decoded::Resources(resources))) => parsed.resources = resources,
            Ok(Ok(Decoded::WebSocketEvents(events))) => parsed.web_socket_events = events,
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                tracing::error!("Decode task panicked: {}", e);
                first_error.get_or_insert(PublicGraphError::InternalError(format!(
                    "decode task failed: {e}"
                )));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(parsed),
    }
}
