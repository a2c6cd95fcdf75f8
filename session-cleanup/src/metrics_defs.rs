use shared::metrics_defs::{MetricDef, MetricType};

pub const SESSIONS_DELETED: MetricDef = MetricDef {
    name: "session_cleanup.sessions.deleted",
    metric_type: MetricType::Counter,
    description: "Session rows deleted by batch cleanup",
};

pub const SESSION_FIELDS_DELETED: MetricDef = MetricDef {
    name: "session_cleanup.session_fields.deleted",
    metric_type: MetricType::Counter,
    description: "Session field rows deleted by batch cleanup",
};

pub const BATCH_FAILURES: MetricDef = MetricDef {
    name: "session_cleanup.batch.failures",
    metric_type: MetricType::Counter,
    description: "Cleanup batches that failed. Tagged with stage.",
};

pub const ALL_METRICS: &[MetricDef] = &[SESSIONS_DELETED, SESSION_FIELDS_DELETED, BATCH_FAILURES];
