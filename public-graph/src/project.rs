use crate::config::ValidationError;
use harsh::Harsh;
use serde::Deserialize;
use std::collections::HashMap;

fn default_alphabet() -> String {
    "abcdefghijklmnopqrstuvwxyz1234567890".to_string()
}

fn default_min_length() -> usize {
    8
}

/// How public project identifiers are encoded.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProjectsConfig {
    /// Hashid salt shared with the services that hand out verbose ids.
    #[serde(default)]
    pub salt: String,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    /// Fixed verbose ids, checked before decoding.
    #[serde(default)]
    pub aliases: HashMap<String, i32>,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            salt: String::new(),
            min_length: default_min_length(),
            alphabet: default_alphabet(),
            aliases: HashMap::new(),
        }
    }
}

/// Resolves the verbose project id sent by SDKs to a numeric project id.
///
/// Lookup order: configured aliases, then a plain decimal as sent by old
/// SDKs, then the hashid encoding. Only positive ids resolve.
#[derive(Clone, Debug)]
pub struct ProjectDirectory {
    aliases: HashMap<String, i32>,
    hashids: Harsh,
}

impl ProjectDirectory {
    pub fn new(config: &ProjectsConfig) -> Result<Self, ValidationError> {
        let hashids = Harsh::builder()
            .salt(config.salt.as_bytes())
            .length(config.min_length)
            .alphabet(config.alphabet.as_bytes())
            .build()
            .map_err(|e| ValidationError::InvalidProjectEncoding(e.to_string()))?;

        Ok(Self {
            aliases: config.aliases.clone(),
            hashids,
        })
    }

    pub fn resolve(&self, verbose_id: &str) -> Option<i32> {
        let verbose_id = verbose_id.trim();
        if let Some(project_id) = self.aliases.get(verbose_id) {
            return Some(*project_id);
        }
        match verbose_id.parse::<i32>() {
            Ok(project_id) => Some(project_id),
            Err(_) => self.decode(verbose_id),
        }
        .filter(|id| *id > 0)
    }

    /// Verbose id of `project_id`.
    pub fn encode(&self, project_id: i32) -> Option<String> {
        u64::try_from(project_id)
            .ok()
            .map(|id| self.hashids.encode(&[id]))
    }

    fn decode(&self, verbose_id: &str) -> Option<i32> {
        match self.hashids.decode(verbose_id).ok()?.as_slice() {
            [id] => i32::try_from(*id).ok(),
            _ => None,
        }
    }
}
