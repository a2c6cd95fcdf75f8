//! Redis-backed [`SessionStore`].
//!
//! Keys are shared with the consumers:
//!
//! - `session-pending-<secureID>` holds `1` while a session awaits its first
//!   processed payload. Consumers clear it; it otherwise expires.
//! - `billing-quota-exceeded-<projectID>-<product>` is written by the billing
//!   worker. A missing key means the quota is not exceeded.

use super::{ProductType, SessionStore, StoreError};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use url::Url;

pub(crate) fn pending_session_key(secure_id: &str) -> String {
    format!("session-pending-{secure_id}")
}

pub(crate) fn billing_quota_exceeded_key(project_id: i32, product: ProductType) -> String {
    format!("billing-quota-exceeded-{project_id}-{}", product.as_str())
}

fn flag_value(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

/// Reads a boolean flag the way the other writers of these keys encode it.
pub(crate) fn parse_flag(key: &str, value: &str) -> Result<bool, StoreError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(StoreError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

pub struct RedisStore {
    connection: ConnectionManager,
    pending_ttl: Duration,
}

impl RedisStore {
    /// Connects to `url`. The connection is re-established on failure.
    pub async fn connect(url: &Url, pending_ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url.as_str())?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            pending_ttl,
        })
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn set_pending_session(&self, secure_id: &str, pending: bool) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(
                pending_session_key(secure_id),
                flag_value(pending),
                self.pending_ttl.as_secs(),
            )
            .await?;
        Ok(())
    }

    async fn is_billing_quota_exceeded(
        &self,
        project_id: i32,
        product: ProductType,
    ) -> Result<bool, StoreError> {
        let key = billing_quota_exceeded_key(project_id, product);
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(&key).await?;
        match value {
            Some(value) => parse_flag(&key, &value),
            None => Ok(false),
        }
    }
}
