//! Ephemeral per-session state and the billing quota lookup.

mod redis_store;

pub use redis_store::RedisStore;

use async_trait::async_trait;
use moka::sync::Cache;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

/// Billable product a quota applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductType {
    Sessions,
}

impl ProductType {
    /// Name used in store keys and metric labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Sessions => "Sessions",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("unexpected value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// The fast key/value store shared with the consumers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Marks a session as awaiting its first processed payload.
    async fn set_pending_session(&self, secure_id: &str, pending: bool) -> Result<(), StoreError>;

    async fn is_billing_quota_exceeded(
        &self,
        project_id: i32,
        product: ProductType,
    ) -> Result<bool, StoreError>;
}

fn default_pending_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Which session store backs the graph.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Shared with the consumers that clear pending flags and publish quota
    /// state.
    Redis {
        url: Url,
        #[serde(default = "default_pending_session_ttl_secs")]
        pending_session_ttl_secs: u64,
    },
    /// Process-local. Nothing downstream can observe it.
    Memory {
        #[serde(default = "default_pending_session_ttl_secs")]
        pending_session_ttl_secs: u64,
        /// Projects whose session quota is reported as exhausted.
        #[serde(default)]
        quota_exceeded_projects: Vec<i32>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory {
            pending_session_ttl_secs: default_pending_session_ttl_secs(),
            quota_exceeded_projects: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// How long a pending flag survives without being cleared.
    pub fn pending_session_ttl(&self) -> Duration {
        match self {
            StoreConfig::Redis {
                pending_session_ttl_secs,
                ..
            }
            | StoreConfig::Memory {
                pending_session_ttl_secs,
                ..
            } => Duration::from_secs(*pending_session_ttl_secs),
        }
    }

    pub async fn build(&self) -> Result<Arc<dyn SessionStore>, StoreError> {
        match self {
            StoreConfig::Redis { url, .. } => {
                tracing::info!(url = %url, "Using Redis session store");
                Ok(Arc::new(
                    RedisStore::connect(url, self.pending_session_ttl()).await?,
                ))
            }
            StoreConfig::Memory {
                quota_exceeded_projects,
                ..
            } => {
                tracing::warn!(
                    "Using the in-memory session store. Pending flags are not visible to consumers."
                );
                let store = MemoryStore::new(self.pending_session_ttl());
                for project_id in quota_exceeded_projects {
                    store.set_quota_exceeded(*project_id, ProductType::Sessions, true);
                }
                Ok(Arc::new(store))
            }
        }
    }
}

/// In-process [`SessionStore`].
///
/// Pending flags expire after the configured TTL. Quota state is static
/// apart from [`MemoryStore::set_quota_exceeded`].
pub struct MemoryStore {
    pending: Cache<String, bool>,
    exceeded: RwLock<HashSet<(i32, ProductType)>>,
}

impl MemoryStore {
    pub fn new(pending_ttl: Duration) -> Self {
        Self {
            pending: Cache::builder().time_to_live(pending_ttl).build(),
            exceeded: RwLock::new(HashSet::new()),
        }
    }

    pub fn set_quota_exceeded(&self, project_id: i32, product: ProductType, exceeded: bool) {
        let Ok(mut entries) = self.exceeded.write() else {
            tracing::error!("Quota table lock poisoned");
            return;
        };
        if exceeded {
            entries.insert((project_id, product));
        } else {
            entries.remove(&(project_id, product));
        }
    }

    pub fn is_pending(&self, secure_id: &str) -> bool {
        self.pending.get(secure_id).unwrap_or(false)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn set_pending_session(&self, secure_id: &str, pending: bool) -> Result<(), StoreError> {
        if pending {
            self.pending.insert(secure_id.to_string(), true);
        } else {
            self.pending.invalidate(secure_id);
        }
        Ok(())
    }

    async fn is_billing_quota_exceeded(
        &self,
        project_id: i32,
        product: ProductType,
    ) -> Result<bool, StoreError> {
        self.exceeded
            .read()
            .map(|entries| entries.contains(&(project_id, product)))
            .map_err(|_| StoreError::Unavailable("quota table lock poisoned".into()))
    }
}
