//! Metrics definitions for the broker producers.

use shared::metrics_defs::{MetricDef, MetricType};

pub const BROKER_REQUEST_DURATION: MetricDef = MetricDef {
    name: "broker.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent on one produce request to the broker in seconds",
};

pub const BROKER_REQUEST_RECORDS: MetricDef = MetricDef {
    name: "broker.request.records",
    metric_type: MetricType::Histogram,
    description: "Number of records carried by one produce request",
};

pub const ALL_METRICS: &[MetricDef] = &[BROKER_REQUEST_DURATION, BROKER_REQUEST_RECORDS];
