//! Structured inputs reported by the SDKs.
//!
//! These arrive already decoded as part of a request and travel unchanged
//! inside outbound messages, so they live next to the message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Session replay events, kept opaque.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayEventsInput {
    #[serde(default)]
    pub events: Vec<JsonValue>,
}

/// An error captured by a browser SDK.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorObjectInput {
    pub event: String,
    pub r#type: String,
    pub url: String,
    pub source: String,
    pub line_number: i64,
    pub column_number: i64,
    #[serde(default)]
    pub stack_trace: Vec<JsonValue>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    pub version: String,
}

/// An error reported by a backend SDK, optionally tied to a frontend session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendErrorObjectInput {
    #[serde(default, rename = "sessionSecureID")]
    pub session_secure_id: Option<String>,
    #[serde(default, rename = "requestID")]
    pub request_id: Option<String>,
    #[serde(default, rename = "traceID")]
    pub trace_id: Option<String>,
    #[serde(default, rename = "spanID")]
    pub span_id: Option<String>,
    #[serde(default)]
    pub log_cursor: Option<String>,
    pub event: String,
    pub r#type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub stack_trace: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub service: ServiceInput,
    #[serde(default)]
    pub environment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricTag {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricInput {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(default, rename = "spanID")]
    pub span_id: Option<String>,
    #[serde(default, rename = "parentSpanID")]
    pub parent_span_id: Option<String>,
    #[serde(default, rename = "traceID")]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<MetricTag>,
}
