//! The public ingestion graph.
//!
//! Accepts telemetry from browser and backend SDKs and hands it to the broker.
//! Client payloads go through decode, chunking and routing before they are
//! submitted as one keyed batch per payload:
//!
//! ```text
//! raw sub-payloads -> parse -> chunk -> encode/route -> producer
//! ```
//!
//! Session initialization and the backend error fan-out share the producer
//! and the routing rules but have their own failure semantics, documented in
//! [`session`] and [`fanout`].

pub mod chunk;
pub mod config;
pub mod encode;
pub mod errors;
pub mod fanout;
pub mod metrics_defs;
pub mod parse;
pub mod project;
pub mod protocol;
mod push_payload;
pub mod resolver;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
mod testutils;

pub use errors::PublicGraphError;
pub use resolver::PublicGraph;
pub use service::PublicGraphService;

use project::ProjectDirectory;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

/// Builds the graph described by `config`, connecting to its session store.
pub async fn build(config: &config::Config) -> Result<PublicGraph, PublicGraphError> {
    let producer = config.producer.build()?;
    let store = config.store.build().await?;
    let projects = ProjectDirectory::new(&config.projects)?;
    Ok(PublicGraph::new(producer, store, projects))
}

pub async fn run(config: config::Config) -> Result<(), PublicGraphError> {
    config.validate()?;

    let graph = Arc::new(build(&config).await?);

    let ready_graph = graph.clone();
    let admin_service = AdminService::<_, PublicGraphError>::new(move || ready_graph.is_ready());

    let graph_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        PublicGraphService::new(graph),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(graph_task, admin_task)?;
    Ok(())
}
