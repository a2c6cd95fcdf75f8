//! Splitting of decoded payloads into bounded chunks.
//!
//! Each content type is split on its own with a fixed group size. Groups that
//! share an index are then merged into one [`Chunk`]; the numbering is the
//! only thing that ties a log group to a resource group.

use crate::parse::{LogRow, ParsedSubPayloads};
use queue::model::ErrorObjectInput;
use serde_json::Value as JsonValue;

pub const LOG_ROWS_GROUP_SIZE: usize = 1024;
pub const WEB_SOCKET_EVENTS_GROUP_SIZE: usize = 1024;
pub const RESOURCES_GROUP_SIZE: usize = 1;

/// Splits `items` into consecutive groups of `group_size`, the last one
/// possibly shorter. An empty input yields no groups.
pub fn split_into_groups<T>(items: Vec<T>, group_size: usize) -> Vec<Vec<T>> {
    let group_size = group_size.max(1);
    let mut groups = Vec::with_capacity(items.len().div_ceil(group_size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        groups.push(items.by_ref().take(group_size).collect());
    }

    groups
}

/// Content of one outbound push message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chunk {
    pub index: usize,
    /// Only populated on chunk 0.
    pub events: Vec<JsonValue>,
    /// Only populated on chunk 0.
    pub errors: Vec<ErrorObjectInput>,
    pub log_rows: Vec<LogRow>,
    pub resources: Vec<JsonValue>,
    /// `None` when this index has no websocket group.
    pub web_socket_events: Option<Vec<JsonValue>>,
}

/// The independently indexed groups of one payload.
#[derive(Debug, Default)]
pub struct ChunkGroups {
    pub events: Vec<JsonValue>,
    pub errors: Vec<ErrorObjectInput>,
    pub log_rows: Vec<Vec<LogRow>>,
    pub resources: Vec<Vec<JsonValue>>,
    pub web_socket_events: Vec<Vec<JsonValue>>,
}

impl ChunkGroups {
    /// Applies the per-content-type group sizes. Events and errors are never
    /// split.
    pub fn split(
        events: Vec<JsonValue>,
        errors: Vec<ErrorObjectInput>,
        parsed: ParsedSubPayloads,
    ) -> Self {
        Self {
            events,
            errors,
            log_rows: split_into_groups(parsed.log_rows, LOG_ROWS_GROUP_SIZE),
            resources: split_into_groups(parsed.resources, RESOURCES_GROUP_SIZE),
            web_socket_events: split_into_groups(
                parsed.web_socket_events,
                WEB_SOCKET_EVENTS_GROUP_SIZE,
            ),
        }
    }

    /// Number of chunks the groups assemble into. The events group always
    /// occupies index 0, so there is at least one.
    pub fn chunk_count(&self) -> usize {
        1usize
            .max(self.log_rows.len())
            .max(self.resources.len())
            .max(self.web_socket_events.len())
    }

    /// Merges same-index groups, yielding chunks in ascending index order.
    pub fn assemble(self) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = (0..self.chunk_count())
            .map(|index| Chunk {
                index,
                ..Chunk::default()
            })
            .collect();

        if let Some(first) = chunks.first_mut() {
            first.events = self.events;
            first.errors = self.errors;
        }
        for (chunk, rows) in chunks.iter_mut().zip(self.log_rows) {
            chunk.log_rows = rows;
        }
        for (chunk, resources) in chunks.iter_mut().zip(self.resources) {
            chunk.resources = resources;
        }
        for (chunk, events) in chunks.iter_mut().zip(self.web_socket_events) {
            chunk.web_socket_events = Some(events);
        }

        chunks
    }
}
