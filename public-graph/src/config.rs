use crate::project::{ProjectDirectory, ProjectsConfig};
use crate::store::StoreConfig;
use queue::ProducerConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Producer topic cannot be empty")]
    EmptyTopic,

    #[error("Producer timeout cannot be 0")]
    InvalidTimeout,

    #[error("Pending session TTL cannot be 0")]
    InvalidTtl,

    #[error("Project alias must map to a positive id: {0}")]
    InvalidProjectAlias(String),

    #[error("Invalid project id encoding: {0}")]
    InvalidProjectEncoding(String),
}

/// Public graph configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the client-facing operations
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Where accepted messages are submitted
    pub producer: ProducerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if let ProducerConfig::KafkaRest {
            topic,
            timeout_secs,
            ..
        } = &self.producer
        {
            if topic.is_empty() {
                return Err(ValidationError::EmptyTopic);
            }
            if *timeout_secs == 0 {
                return Err(ValidationError::InvalidTimeout);
            }
        }

        if self.store.pending_session_ttl().is_zero() {
            return Err(ValidationError::InvalidTtl);
        }

        if let Some((alias, _)) = self.projects.aliases.iter().find(|(_, id)| **id <= 0) {
            return Err(ValidationError::InvalidProjectAlias(alias.clone()));
        }
        ProjectDirectory::new(&self.projects)?;

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use url::Url;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8082
admin_listener:
    host: "127.0.0.1"
    port: 8083
producer:
    type: kafka_rest
    url: "http://kafka-rest:8082"
    topic: dev
store:
    type: redis
    url: "redis://redis:6379"
    pending_session_ttl_secs: 600
projects:
    salt: "secret"
    aliases:
        demo: 1
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8082);
        assert_eq!(
            config.producer,
            ProducerConfig::KafkaRest {
                url: Url::parse("http://kafka-rest:8082").unwrap(),
                topic: "dev".into(),
                timeout_secs: 10,
            }
        );
        assert_eq!(
            config.store,
            StoreConfig::Redis {
                url: Url::parse("redis://redis:6379").unwrap(),
                pending_session_ttl_secs: 600,
            }
        );
        assert_eq!(config.projects.salt, "secret");
        assert_eq!(config.projects.min_length, 8);
        assert_eq!(config.projects.aliases.get("demo"), Some(&1));
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 8082}
admin_listener: {host: "127.0.0.1", port: 8083}
producer: {type: memory}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.projects, ProjectsConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let base_config = Config {
            listener: Listener {
                host: "0.0.0.0".to_string(),
                port: 8082,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 8083,
            },
            producer: ProducerConfig::KafkaRest {
                url: Url::parse("http://127.0.0.1:8082").unwrap(),
                topic: "dev".to_string(),
                timeout_secs: 5,
            },
            store: StoreConfig::default(),
            projects: ProjectsConfig::default(),
        };
        assert!(base_config.validate().is_ok());

        let mut config = base_config.clone();
        config.admin_listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config.clone();
        config.producer = ProducerConfig::KafkaRest {
            url: Url::parse("http://127.0.0.1:8082").unwrap(),
            topic: String::new(),
            timeout_secs: 5,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyTopic
        ));

        let mut config = base_config.clone();
        config.producer = ProducerConfig::KafkaRest {
            url: Url::parse("http://127.0.0.1:8082").unwrap(),
            topic: "dev".to_string(),
            timeout_secs: 0,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidTimeout
        ));

        let mut config = base_config.clone();
        config.store = StoreConfig::Memory {
            pending_session_ttl_secs: 0,
            quota_exceeded_projects: vec![],
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidTtl
        ));

        let mut config = base_config.clone();
        config.projects.aliases = HashMap::from([("bad".to_string(), 0)]);
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidProjectAlias(alias) if alias == "bad"
        ));

        let mut config = base_config;
        config.projects.alphabet = "aabbcc".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidProjectEncoding(_)
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Unknown producer type
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 8082}
admin_listener: {host: "127.0.0.1", port: 8083}
producer: {type: carrier_pigeon}
"#
            )
            .is_err()
        );

        // Missing producer
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 8082}
admin_listener: {host: "127.0.0.1", port: 8083}
"#
            )
            .is_err()
        );
    }
}
