//! HTTP surface of the public graph.
//!
//! Every operation is a `POST /<operationName>` whose body holds the
//! operation's variables as a JSON object. Responses always use the
//! `{"data": ..., "errors": [...]}` envelope.

use crate::errors::{PublicGraphError, Result};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::protocol::{GraphResponse, RequestContext};
use crate::resolver::PublicGraph;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{ACCEPT_LANGUAGE, HeaderName, USER_AGENT};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use shared::http::{PeerAddr, make_boxed_error_response, make_json_response};
use shared::{gauge, histogram};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    InitializeSession,
    IdentifySession,
    AddSessionProperties,
    PushPayload,
    PushPayloadCompressed,
    PushBackendPayload,
    PushMetrics,
    AddSessionFeedback,
    /// Sent by old SDKs; accepted and ignored.
    MarkBackendSetup,
}

impl Operation {
    pub fn from_path(path: &str) -> Option<Self> {
        let operation = match path.trim_start_matches('/') {
            "initializeSession" => Operation::InitializeSession,
            "identifySession" => Operation::IdentifySession,
            "addSessionProperties" => Operation::AddSessionProperties,
            "pushPayload" => Operation::PushPayload,
            "pushPayloadCompressed" => Operation::PushPayloadCompressed,
            "pushBackendPayload" => Operation::PushBackendPayload,
            "pushMetrics" => Operation::PushMetrics,
            "addSessionFeedback" => Operation::AddSessionFeedback,
            "markBackendSetup" => Operation::MarkBackendSetup,
            _ => return None,
        };
        Some(operation)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::InitializeSession => "initializeSession",
            Operation::IdentifySession => "identifySession",
            Operation::AddSessionProperties => "addSessionProperties",
            Operation::PushPayload => "pushPayload",
            Operation::PushPayloadCompressed => "pushPayloadCompressed",
            Operation::PushBackendPayload => "pushBackendPayload",
            Operation::PushMetrics => "pushMetrics",
            Operation::AddSessionFeedback => "addSessionFeedback",
            Operation::MarkBackendSetup => "markBackendSetup",
        }
    }
}

fn header_value<B>(req: &Request<B>, name: HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Client ip and headers the session initialization records.
///
/// The ip is the first `X-Forwarded-For` entry, falling back to the peer
/// address of the connection.
pub fn request_context<B>(req: &Request<B>) -> RequestContext {
    let forwarded = req
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);
    let ip = forwarded
        .or_else(|| {
            req.extensions()
                .get::<PeerAddr>()
                .map(|PeerAddr(addr)| addr.ip().to_string())
        })
        .unwrap_or_default();

    RequestContext {
        user_agent: header_value(req, USER_AGENT),
        accept_language: header_value(req, ACCEPT_LANGUAGE),
        ip,
    }
}

fn variables<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| PublicGraphError::InvalidRequest(e.to_string()))
}

fn to_data<T: serde::Serialize>(value: T) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| PublicGraphError::ResponseSerializationError(e.to_string()))
}

impl PublicGraph {
    async fn execute(
        &self,
        operation: Operation,
        body: &[u8],
        context: RequestContext,
    ) -> Result<JsonValue> {
        match operation {
            Operation::InitializeSession => {
                to_data(self.initialize_session(variables(body)?, context).await?)
            }
            Operation::IdentifySession => to_data(self.identify_session(variables(body)?).await?),
            Operation::AddSessionProperties => {
                to_data(self.add_session_properties(variables(body)?).await?)
            }
            Operation::PushPayload => to_data(self.push_payload(variables(body)?).await?),
            Operation::PushPayloadCompressed => {
                self.push_payload_compressed(variables(body)?).await?;
                Ok(JsonValue::Null)
            }
            Operation::PushBackendPayload => {
                let report = self.push_backend_payload(variables(body)?).await;
                tracing::debug!(
                    groups = report.groups,
                    failed = report.failed.len(),
                    "Backend payload fanned out"
                );
                Ok(JsonValue::Null)
            }
            Operation::PushMetrics => to_data(self.push_metrics(variables(body)?).await?),
            Operation::AddSessionFeedback => {
                to_data(self.add_session_feedback(variables(body)?).await?)
            }
            Operation::MarkBackendSetup => Ok(JsonValue::Null),
        }
    }
}

fn respond(result: Result<JsonValue>) -> Response<BoxBody<Bytes, PublicGraphError>> {
    let (status, body) = match result {
        Ok(data) => (StatusCode::OK, GraphResponse::data(data)),
        Err(e) => {
            let data = e
                .session_response()
                .and_then(|response| serde_json::to_value(response).ok());
            if e.status_code().is_server_error() {
                tracing::error!(error = %e, code = e.code(), "Operation failed");
            } else {
                tracing::debug!(error = %e, code = e.code(), "Operation returned an error");
            }
            (e.status_code(), GraphResponse::error(data, e.to_string()))
        }
    };

    make_json_response(status, &body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize response");
        make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Holds one slot of the in-flight gauge until dropped, so requests whose
/// future is cancelled still release it.
struct InflightGuard;

impl InflightGuard {
    fn acquire() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

/// Routes one request to its operation and shapes the response.
pub async fn handle<B>(
    graph: &PublicGraph,
    req: Request<B>,
) -> Response<BoxBody<Bytes, PublicGraphError>>
where
    B: Body,
    B::Error: Display,
{
    let Some(operation) = Operation::from_path(req.uri().path()) else {
        tracing::debug!(path = %req.uri().path(), "Unknown operation");
        return make_boxed_error_response(StatusCode::NOT_FOUND);
    };
    if req.method() != Method::POST {
        return make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    let inflight = InflightGuard::acquire();
    let start = Instant::now();

    let context = request_context(&req);
    let result = match req.into_body().collect().await {
        Ok(collected) => {
            graph
                .execute(operation, &collected.to_bytes(), context)
                .await
        }
        Err(e) => Err(PublicGraphError::RequestBodyError(e.to_string())),
    };
    let response = respond(result);

    drop(inflight);
    histogram!(
        REQUEST_DURATION,
        "operation" => operation.as_str(),
        "status" => response.status().as_str().to_string()
    )
    .record(start.elapsed().as_secs_f64());

    response
}

#[derive(Clone)]
pub struct PublicGraphService {
    graph: Arc<PublicGraph>,
}

impl PublicGraphService {
    pub fn new(graph: Arc<PublicGraph>) -> Self {
        Self { graph }
    }
}

impl Service<Request<Incoming>> for PublicGraphService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = PublicGraphError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let graph = self.graph.clone();
        Box::pin(async move { Ok(handle(&graph, req).await) })
    }
}
