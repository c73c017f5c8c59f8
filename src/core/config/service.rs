use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use super::paths::AppPaths;
use super::types::AppConfig;
use super::validation::validate_config;
use crate::llm::ProviderKind;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("config does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    config_override: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self {
            paths,
            config_override: None,
        }
    }

    /// Read the public config from `path` instead of the default location.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config_override {
            return path.clone();
        }

        if let Ok(path) = env::var("CODECHAT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Public config deep-merged with the secrets file, as raw JSON.
    pub fn load_config(&self) -> Result<Value, ConfigError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    /// Validated, typed configuration with environment overrides applied.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let raw = self.load_config()?;
        validate_config(&raw)?;
        let mut config: AppConfig = serde_json::from_value(raw)?;
        apply_env_overrides(&mut config, |key| env::var(key).ok());
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(_) => Ok(value),
        // An empty YAML document parses as null.
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ConfigError::Invalid(format!(
            "Invalid config in {}: expected a mapping at the top level",
            path.display()
        ))),
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").and_then(|val| val.parse::<u16>().ok()) {
        config.server.port = port;
    }

    if config.providers.api_key.is_none() {
        let key_var = match config.providers.kind {
            ProviderKind::Gemini => "GOOGLE_API_KEY",
            ProviderKind::OpenaiCompat => "OPENAI_API_KEY",
        };
        config.providers.api_key = lookup(key_var).filter(|key| !key.trim().is_empty());
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
