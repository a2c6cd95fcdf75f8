use crate::chunk::ChunkGroups;
use crate::encode::{PayloadContext, route_chunks};
use crate::errors::Result;
use crate::metrics_defs::{PAYLOAD_CHUNKS, PAYLOAD_EVENTS_SIZE};
use crate::parse::{RawSubPayloads, parse_sub_payloads};
use crate::protocol::PushPayloadRequest;
use crate::resolver::PublicGraph;
use serde_json::Value as JsonValue;
use shared::histogram;

/// Rough in-memory footprint of a decoded JSON value.
fn approximate_size(value: &JsonValue) -> usize {
    match value {
        JsonValue::Null => 4,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 8,
        JsonValue::String(s) => s.len(),
        JsonValue::Array(items) => items.iter().map(approximate_size).sum(),
        JsonValue::Object(fields) => fields
            .iter()
            .map(|(key, value)| key.len() + approximate_size(value))
            .sum(),
    }
}

impl PublicGraph {
    /// Decodes, chunks and submits one client payload as a single batch.
    ///
    /// Returns the number of chunks submitted. Nothing is submitted unless
    /// every sub-payload decodes and every chunk encodes.
    pub async fn push_payload(&self, req: PushPayloadRequest) -> Result<usize> {
        let context = PayloadContext {
            session_secure_id: req.session_secure_id,
            payload_id: req.payload_id.unwrap_or(0),
            is_beacon: req.is_beacon,
            has_session_unloaded: req.has_session_unloaded,
            highlight_logs: req.highlight_logs,
        };

        let parsed = parse_sub_payloads(RawSubPayloads {
            messages: req.messages,
            resources: req.resources,
            web_socket_events: req.web_socket_events,
        })
        .await?;

        let events_size: usize = req.events.events.iter().map(approximate_size).sum();
        histogram!(PAYLOAD_EVENTS_SIZE).record(events_size as f64);

        let chunks = ChunkGroups::split(req.events.events, req.errors, parsed).assemble();
        let chunk_count = chunks.len();
        let batch = route_chunks(&context, chunks, self.encoder.as_ref())?;

        tracing::debug!(
            secure_id = %context.session_secure_id,
            payload_id = context.payload_id,
            chunk_count,
            events_size,
            "Submitting payload"
        );
        histogram!(PAYLOAD_CHUNKS).record(chunk_count as f64);
        self.submit(&batch.key, batch.messages).await?;

        Ok(chunk_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PublicGraphError;
    use crate::testutils::{FailingEncoder, RecordingProducer, graph_with, graph_with_encoder};
    use queue::Message;
    use queue::model::ReplayEventsInput;
    use serde_json::json;
    use std::sync::Arc;

    fn request(log_rows: usize, resources: usize) -> PushPayloadRequest {
        let messages: Vec<JsonValue> = (0..log_rows)
            .map(|i| json!({"type": "log", "time": i, "value": [format!("line {i}")]}))
            .collect();
        let resources: Vec<JsonValue> = (0..resources)
            .map(|i| json!({"name": format!("https://cdn.example.com/{i}.js")}))
            .collect();

        PushPayloadRequest {
            session_secure_id: "secure".into(),
            payload_id: Some(9),
            events: ReplayEventsInput {
                events: vec![json!({"type": 2, "data": {}})],
            },
            messages: json!({ "messages": messages }).to_string(),
            resources: json!({ "resources": resources }).to_string(),
            web_socket_events: None,
            errors: vec![],
            is_beacon: Some(false),
            has_session_unloaded: Some(true),
            highlight_logs: Some("logs".into()),
        }
    }

    #[test]
    fn test_approximate_size() {
        assert_eq!(approximate_size(&json!({"ab": "cde", "f": [1, true]})), 2 + 3 + 1 + 8 + 1);
        assert_eq!(approximate_size(&JsonValue::Null), 4);
    }

    #[tokio::test]
    async fn test_end_to_end_chunking() {
        let producer = Arc::new(RecordingProducer::new());
        let graph = graph_with(producer.clone());

        let chunk_count = graph.push_payload(request(2500, 3)).await.unwrap();
        assert_eq!(chunk_count, 3);

        let batches = producer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].key, "secure");

        let args: Vec<_> = batches[0]
            .messages
            .iter()
            .map(|message| match message {
                Message::PushPayload(args) => args,
                other => panic!("unexpected message {other:?}"),
            })
            .collect();
        assert_eq!(args.len(), 3);
        assert!(args.iter().all(|a| a.payload_id == 9));
        assert!(args.iter().all(|a| a.session_secure_id == "secure"));
        assert!(args.iter().all(|a| a.highlight_logs.as_deref() == Some("logs")));
        assert!(args.iter().all(|a| a.has_session_unloaded == Some(true)));

        assert_eq!(args[0].events.events.len(), 1);
        assert!(args[1].events.events.is_empty());
        assert!(args[2].events.events.is_empty());

        let log_counts: Vec<usize> = args
            .iter()
            .map(|a| crate::parse::decode_log_rows(&a.messages).unwrap().len())
            .collect();
        assert_eq!(log_counts, vec![1024, 1024, 452]);

        for (i, a) in args.iter().enumerate() {
            let resources = crate::parse::decode_resources(&a.resources).unwrap();
            assert_eq!(
                resources,
                vec![json!({"name": format!("https://cdn.example.com/{i}.js")})]
            );
            assert_eq!(a.web_socket_events, None);
        }
    }

    #[tokio::test]
    async fn test_missing_payload_id_defaults_to_zero() {
        let producer = Arc::new(RecordingProducer::new());
        let graph = graph_with(producer.clone());

        let mut req = request(1, 0);
        req.payload_id = None;
        assert_eq!(graph.push_payload(req).await.unwrap(), 1);

        let batches = producer.batches();
        let Message::PushPayload(args) = &batches[0].messages[0] else {
            panic!("expected PushPayload");
        };
        assert_eq!(args.payload_id, 0);
    }

    #[tokio::test]
    async fn test_decode_error_submits_nothing() {
        let producer = Arc::new(RecordingProducer::new());
        let graph = graph_with(producer.clone());

        let mut req = request(10, 2);
        req.web_socket_events = Some("[".into());
        let err = graph.push_payload(req).await.unwrap_err();

        assert!(matches!(err, PublicGraphError::Decode { .. }));
        assert!(producer.batches().is_empty());
        assert_eq!(producer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_serialization_error_submits_nothing() {
        let producer = Arc::new(RecordingProducer::new());
        let graph = graph_with_encoder(producer.clone(), Arc::new(FailingEncoder::at_index(2)));

        let err = graph.push_payload(request(0, 5)).await.unwrap_err();

        assert!(matches!(err, PublicGraphError::Serialization { index: 2, .. }));
        assert!(producer.batches().is_empty());
        assert_eq!(producer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_returned() {
        let producer = Arc::new(RecordingProducer::failing_keys(&["secure"]));
        let graph = graph_with(producer.clone());

        let err = graph.push_payload(request(1, 1)).await.unwrap_err();
        assert!(matches!(err, PublicGraphError::Dispatch(_)));
        assert_eq!(producer.attempts(), 1);
    }
}
