use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "public_graph.request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with operation, status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "public_graph.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const MESSAGES_SUBMITTED: MetricDef = MetricDef {
    name: "public_graph.messages.submitted",
    metric_type: MetricType::Counter,
    description: "Messages accepted by the producer. Tagged with kind.",
};

pub const SUBMIT_FAILURES: MetricDef = MetricDef {
    name: "public_graph.submit.failures",
    metric_type: MetricType::Counter,
    description: "Batches the producer failed to accept. Tagged with kind.",
};

pub const PAYLOAD_CHUNKS: MetricDef = MetricDef {
    name: "public_graph.payload.chunks",
    metric_type: MetricType::Histogram,
    description: "Number of chunks a pushed payload was split into",
};

pub const PAYLOAD_EVENTS_SIZE: MetricDef = MetricDef {
    name: "public_graph.payload.events_size",
    metric_type: MetricType::Histogram,
    description: "Approximate size in bytes of the replay events of a pushed payload",
};

pub const FANOUT_GROUP_FAILURES: MetricDef = MetricDef {
    name: "public_graph.fanout.group_failures",
    metric_type: MetricType::Counter,
    description: "Backend error groups that could not be submitted",
};

pub const QUOTA_EXCEEDED: MetricDef = MetricDef {
    name: "public_graph.quota.exceeded",
    metric_type: MetricType::Counter,
    description: "Session initializations answered with a quota error. Tagged with product.",
};

pub const PENDING_FLAG_FAILURES: MetricDef = MetricDef {
    name: "public_graph.pending_flag.failures",
    metric_type: MetricType::Counter,
    description: "Failed writes of the pending session flag",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    MESSAGES_SUBMITTED,
    SUBMIT_FAILURES,
    PAYLOAD_CHUNKS,
    PAYLOAD_EVENTS_SIZE,
    FANOUT_GROUP_FAILURES,
    QUOTA_EXCEEDED,
    PENDING_FLAG_FAILURES,
];
