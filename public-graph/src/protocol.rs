//! Request and response bodies of the client-facing operations.
//!
//! Field names follow the SDKs, which send camelCase variables and spell
//! identifiers with an upper-case `ID`.

use chrono::{DateTime, Utc};
use queue::model::{BackendErrorObjectInput, ErrorObjectInput, MetricInput, ReplayEventsInput};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSessionRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(rename = "organizationVerboseID")]
    pub organization_verbose_id: String,
    #[serde(default)]
    pub enable_strict_privacy: bool,
    #[serde(default)]
    pub privacy_setting: Option<String>,
    #[serde(default)]
    pub enable_recording_network_contents: bool,
    #[serde(default)]
    pub client_version: String,
    #[serde(default)]
    pub firstload_version: String,
    #[serde(default)]
    pub client_config: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default, rename = "clientID")]
    pub client_id: String,
    #[serde(default)]
    pub network_recording_domains: Vec<String>,
    #[serde(default)]
    pub disable_session_recording: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSessionResponse {
    #[serde(rename = "secureID")]
    pub secure_id: String,
    #[serde(rename = "projectID")]
    pub project_id: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifySessionRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    pub user_identifier: String,
    #[serde(default)]
    pub user_object: JsonValue,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionPropertiesRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(default)]
    pub properties_object: JsonValue,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayloadRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(default, rename = "payloadID")]
    pub payload_id: Option<i64>,
    #[serde(default)]
    pub events: ReplayEventsInput,
    pub messages: String,
    pub resources: String,
    #[serde(default)]
    pub web_socket_events: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorObjectInput>,
    #[serde(default)]
    pub is_beacon: Option<bool>,
    #[serde(default)]
    pub has_session_unloaded: Option<bool>,
    #[serde(default)]
    pub highlight_logs: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayloadCompressedRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(rename = "payloadID")]
    pub payload_id: i64,
    pub data: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushBackendPayloadRequest {
    #[serde(default, rename = "projectID")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<BackendErrorObjectInput>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMetricsRequest {
    #[serde(default)]
    pub metrics: Vec<MetricInput>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionFeedbackRequest {
    #[serde(rename = "sessionSecureID")]
    pub session_secure_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub verbatim: String,
    pub timestamp: DateTime<Utc>,
}

/// Transport details attached to a session when it is initialized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    pub user_agent: String,
    pub accept_language: String,
    pub ip: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphError {
    pub message: String,
}

/// Envelope of every operation response.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphResponse {
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphError>,
}

impl GraphResponse {
    pub fn data(data: JsonValue) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn error(data: Option<JsonValue>, message: impl Into<String>) -> Self {
        Self {
            data,
            errors: vec![GraphError {
                message: message.into(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_payload_defaults() {
        let request: PushPayloadRequest = serde_json::from_value(json!({
            "sessionSecureID": "abc",
            "messages": "{\"messages\":[]}",
            "resources": "{\"resources\":[]}"
        }))
        .unwrap();

        assert_eq!(request.payload_id, None);
        assert!(request.events.events.is_empty());
        assert!(request.errors.is_empty());
        assert_eq!(request.web_socket_events, None);
    }

    #[test]
    fn test_initialize_session_request() {
        let request: InitializeSessionRequest = serde_json::from_value(json!({
            "sessionSecureID": "abc",
            "organizationVerboseID": "1",
            "enableStrictPrivacy": true,
            "clientID": "client",
            "networkRecordingDomains": ["example.com"]
        }))
        .unwrap();

        assert!(request.enable_strict_privacy);
        assert_eq!(request.client_id, "client");
        assert_eq!(request.network_recording_domains, vec!["example.com"]);
        assert_eq!(request.service_name, None);
    }

    #[test]
    fn test_response_shape() {
        let response = InitializeSessionResponse {
            secure_id: "abc".into(),
            project_id: 1,
        };
        let body = GraphResponse::error(
            Some(serde_json::to_value(&response).unwrap()),
            "BillingQuotaExceeded",
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "data": {"secureID": "abc", "projectID": 1},
                "errors": [{"message": "BillingQuotaExceeded"}]
            })
        );
        assert_eq!(
            serde_json::to_value(GraphResponse::data(json!(3))).unwrap(),
            json!({"data": 3})
        );
    }
}
