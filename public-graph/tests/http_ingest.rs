use public_graph::project::{ProjectDirectory, ProjectsConfig};
use public_graph::store::{MemoryStore, ProductType};
use public_graph::{PublicGraph, PublicGraphError, PublicGraphService};
use queue::{MemoryProducer, Message};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

struct TestServer {
    addr: SocketAddr,
    producer: Arc<MemoryProducer>,
    store: Arc<MemoryStore>,
}

async fn start() -> TestServer {
    let producer = Arc::new(MemoryProducer::new());
    let store = Arc::new(MemoryStore::new(Duration::from_secs(60)));
    let projects = ProjectDirectory::new(&ProjectsConfig {
        aliases: HashMap::from([("1jdkoe52".to_string(), 1)]),
        ..Default::default()
    })
    .unwrap();
    let graph = Arc::new(PublicGraph::new(producer.clone(), store.clone(), projects));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(shared::http::serve::<_, _, PublicGraphError>(
        listener,
        PublicGraphService::new(graph),
    ));

    TestServer {
        addr,
        producer,
        store,
    }
}

async fn post(server: &TestServer, operation: &str, variables: JsonValue) -> (u16, JsonValue) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/{operation}", server.addr))
        .header("user-agent", "integration-test")
        .json(&variables)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let server = start().await;

    let (status, body) = post(
        &server,
        "initializeSession",
        json!({
            "sessionSecureID": "s-1",
            "organizationVerboseID": "1jdkoe52",
            "clientVersion": "8.0.0",
            "firstloadVersion": "8.0.0",
            "fingerprint": "fp",
            "clientID": "c-1"
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"data": {"secureID": "s-1", "projectID": 1}}));
    assert!(server.store.is_pending("s-1"));

    let messages: Vec<JsonValue> = (0..2500)
        .map(|i| json!({"type": "log", "time": i, "value": [i]}))
        .collect();
    let resources: Vec<JsonValue> = (0..3).map(|i| json!({"name": i})).collect();
    let (status, body) = post(
        &server,
        "pushPayload",
        json!({
            "sessionSecureID": "s-1",
            "payloadID": 1,
            "events": {"events": [{"type": 2}]},
            "messages": json!({"messages": messages}).to_string(),
            "resources": json!({"resources": resources}).to_string(),
            "errors": []
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"data": 3}));

    let batches = server.producer.batches();
    assert_eq!(batches.len(), 2);
    let Message::InitializeSession(init) = &batches[0].messages[0] else {
        panic!("expected InitializeSession first");
    };
    assert_eq!(init.user_agent, "integration-test");
    assert_eq!(init.ip, "127.0.0.1");

    assert_eq!(batches[1].key, "s-1");
    assert_eq!(batches[1].messages.len(), 3);
    assert!(
        batches[1]
            .messages
            .iter()
            .all(|m| matches!(m, Message::PushPayload(args) if args.payload_id == 1))
    );
}

#[tokio::test]
async fn test_quota_and_errors_over_http() {
    let server = start().await;
    server.store.set_quota_exceeded(1, ProductType::Sessions, true);

    let (status, body) = post(
        &server,
        "initializeSession",
        json!({"sessionSecureID": "s-2", "organizationVerboseID": "1"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["projectID"], 1);
    assert_eq!(body["errors"][0]["message"], "BillingQuotaExceeded");
    assert_eq!(server.producer.batches().len(), 1);

    let (status, body) = post(
        &server,
        "initializeSession",
        json!({"sessionSecureID": "s-3", "organizationVerboseID": "no such project"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body,
        json!({
            "data": {"secureID": "s-3", "projectID": 0},
            "errors": [{"message": "unsupported verbose id: no such project"}]
        })
    );
    assert!(!server.store.is_pending("s-3"));
    assert_eq!(server.producer.batches().len(), 1);

    let (status, body) = post(
        &server,
        "pushPayload",
        json!({
            "sessionSecureID": "s-2",
            "messages": "{\"messages\": 5}",
            "resources": "{\"resources\": []}"
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("messages"));
    assert_eq!(server.producer.batches().len(), 1);

    let (status, _) = post(
        &server,
        "pushBackendPayload",
        json!({
            "projectID": "1",
            "errors": [
                {"sessionSecureID": "s-2", "event": "boom", "type": "BACKEND", "timestamp": "2024-01-01T00:00:00Z"},
                {"event": "anon", "type": "BACKEND", "timestamp": "2024-01-01T00:00:00Z"}
            ]
        }),
    )
    .await;
    assert_eq!(status, 200);
    let batches = server.producer.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1].key, "s-2");
    assert_ne!(batches[2].key, "s-2");
}
