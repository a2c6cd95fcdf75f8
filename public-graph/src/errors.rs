use crate::config::ValidationError;
use crate::parse::SubPayload;
use crate::protocol::InitializeSessionResponse;
use crate::store::StoreError;
use hyper::StatusCode;
use queue::ProducerError;
use thiserror::Error;

/// Result type alias for public graph operations
pub type Result<T, E = PublicGraphError> = std::result::Result<T, E>;

/// Errors that can occur while accepting telemetry
#[derive(Error, Debug)]
pub enum PublicGraphError {
    /// A textual sub-payload was not valid JSON of the expected shape.
    /// Nothing was submitted.
    #[error("failed to decode {part}: {source}")]
    Decode {
        part: SubPayload,
        #[source]
        source: serde_json::Error,
    },

    /// Re-encoding a chunk failed. Nothing was submitted.
    #[error("failed to serialize chunk {index}: {source}")]
    Serialization {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The broker did not accept the batch. Whether it was (partially)
    /// persisted is unknown.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] ProducerError),

    #[error("session store failed: {0}")]
    Store(#[from] StoreError),

    /// The session was initialized but its project is over quota.
    #[error("BillingQuotaExceeded")]
    BillingQuotaExceeded { response: InitializeSessionResponse },

    /// The project id could not be decoded. Nothing was submitted.
    #[error("unsupported verbose id: {verbose_id}")]
    UnsupportedVerboseId {
        verbose_id: String,
        response: InitializeSessionResponse,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublicGraphError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PublicGraphError::Decode { .. }
            | PublicGraphError::UnsupportedVerboseId { .. }
            | PublicGraphError::InvalidRequest(_)
            | PublicGraphError::RequestBodyError(_) => StatusCode::BAD_REQUEST,
            PublicGraphError::Dispatch(_) | PublicGraphError::Store(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PublicGraphError::BillingQuotaExceeded { .. } => StatusCode::OK,
            PublicGraphError::Serialization { .. }
            | PublicGraphError::ResponseSerializationError(_)
            | PublicGraphError::InternalError(_)
            | PublicGraphError::Config(_)
            | PublicGraphError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Tag used for metrics.
    pub fn code(&self) -> &'static str {
        match self {
            PublicGraphError::Decode { .. } => "decode",
            PublicGraphError::Serialization { .. } => "serialization",
            PublicGraphError::Dispatch(_) => "dispatch",
            PublicGraphError::Store(_) => "store",
            PublicGraphError::BillingQuotaExceeded { .. } => "billing_quota_exceeded",
            PublicGraphError::UnsupportedVerboseId { .. } => "unsupported_verbose_id",
            PublicGraphError::InvalidRequest(_) => "invalid_request",
            PublicGraphError::RequestBodyError(_) => "request_body",
            PublicGraphError::ResponseSerializationError(_) => "response_serialization",
            PublicGraphError::InternalError(_) => "internal",
            PublicGraphError::Config(_) => "config",
            PublicGraphError::Io(_) => "io",
        }
    }

    /// Session data that is still returned alongside the error.
    pub fn session_response(&self) -> Option<&InitializeSessionResponse> {
        match self {
            PublicGraphError::BillingQuotaExceeded { response }
            | PublicGraphError::UnsupportedVerboseId { response, .. } => Some(response),
            _ => None,
        }
    }
}
