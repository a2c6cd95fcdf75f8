//! Wire format of the messages handed to the broker.
//!
//! Every message serializes as `{"type": "<Kind>", "payload": {...}}` with
//! exactly one variant payload populated.

use crate::model::{
    BackendErrorObjectInput, ErrorObjectInput, MetricInput, ReplayEventsInput,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    InitializeSession(InitializeSessionArgs),
    IdentifySession(IdentifySessionArgs),
    AddSessionProperties(AddSessionPropertiesArgs),
    PushPayload(PushPayloadArgs),
    PushPayloadCompressed(PushPayloadCompressedArgs),
    PushBackendPayload(PushBackendPayloadArgs),
    AddSessionFeedback(AddSessionFeedbackArgs),
    PushMetrics(PushMetricsArgs),
}

impl Message {
    /// Stable name of the variant, used as a metric tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::InitializeSession(_) => "initialize_session",
            Message::IdentifySession(_) => "identify_session",
            Message::AddSessionProperties(_) => "add_session_properties",
            Message::PushPayload(_) => "push_payload",
            Message::PushPayloadCompressed(_) => "push_payload_compressed",
            Message::PushBackendPayload(_) => "push_backend_payload",
            Message::AddSessionFeedback(_) => "add_session_feedback",
            Message::PushMetrics(_) => "push_metrics",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSessionArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "projectVerboseID")]
    pub project_verbose_id: String,
    pub enable_strict_privacy: bool,
    pub privacy_setting: Option<String>,
    pub enable_recording_network_contents: bool,
    pub client_version: String,
    pub firstload_version: String,
    pub client_config: String,
    pub environment: String,
    pub app_version: Option<String>,
    pub service_name: String,
    pub fingerprint: String,
    pub user_agent: String,
    pub accept_language: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub network_recording_domains: Vec<String>,
    pub disable_session_recording: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifySessionArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub user_identifier: String,
    pub user_object: JsonValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionPropertiesArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub properties_object: JsonValue,
}

/// One chunk of a client payload.
///
/// `messages`, `resources` and `web_socket_events` hold the re-encoded JSON
/// text of this chunk's slice of each sub-payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayloadArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub events: ReplayEventsInput,
    pub messages: String,
    pub resources: String,
    pub web_socket_events: Option<String>,
    pub errors: Vec<ErrorObjectInput>,
    pub is_beacon: Option<bool>,
    pub has_session_unloaded: Option<bool>,
    pub highlight_logs: Option<String>,
    #[serde(rename = "payloadID")]
    pub payload_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayloadCompressedArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(rename = "payloadID")]
    pub payload_id: i64,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushBackendPayloadArgs {
    #[serde(rename = "projectVerboseID")]
    pub project_verbose_id: Option<String>,
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: Option<String>,
    pub errors: Vec<BackendErrorObjectInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionFeedbackArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub verbatim: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMetricsArgs {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub metrics: Vec<MetricInput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let message = Message::PushPayloadCompressed(PushPayloadCompressedArgs {
            session_secure_id: "abc".into(),
            payload_id: 7,
            data: "H4sI".into(),
        });

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "PushPayloadCompressed",
                "payload": {"sessionSecureID": "abc", "payloadID": 7, "data": "H4sI"}
            })
        );
        assert_eq!(message.kind(), "push_payload_compressed");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_value::<Message>(json!({
            "type": "MarkBackendSetup",
            "payload": {}
        }));
        assert!(result.is_err());
    }
}
