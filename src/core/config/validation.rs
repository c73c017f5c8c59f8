use serde_json::{Map, Value};

use super::service::ConfigError;

pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_optional_string_field(corpus, "corpus.path", "path")?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_optional_string_field(ingest, "ingest.source_dir", "source_dir")?;
        validate_optional_string_field(ingest, "ingest.base_dir", "base_dir")?;
        validate_string_array_field(ingest, "ingest.patterns", "patterns")?;
        validate_u64_field(ingest, "ingest.max_chars", "max_chars", 1, 1_000_000)?;
        validate_u64_field(ingest, "ingest.concurrency", "concurrency", 1, 256)?;
        validate_u64_field(ingest, "ingest.max_retries", "max_retries", 0, 20)?;
        validate_u64_field(
            ingest,
            "ingest.retry_backoff_ms",
            "retry_backoff_ms",
            0,
            600_000,
        )?;
    }

    if let Some(query) = expect_optional_object(root, "query")? {
        validate_u64_field(query, "query.top_k", "top_k", 1, 100)?;
        validate_optional_string_field(query, "query.subject", "subject")?;
        validate_u64_field(
            query,
            "query.max_question_chars",
            "max_question_chars",
            1,
            1_000_000,
        )?;
    }

    if let Some(providers) = expect_optional_object(root, "providers")? {
        validate_enum_field(
            providers,
            "providers.kind",
            "kind",
            &["gemini", "openai_compat"],
        )?;
        validate_optional_string_field(providers, "providers.base_url", "base_url")?;
        validate_optional_string_field(providers, "providers.api_key", "api_key")?;
        validate_optional_string_field(
            providers,
            "providers.embedding_model",
            "embedding_model",
        )?;
        validate_optional_string_field(
            providers,
            "providers.generation_model",
            "generation_model",
        )?;
        validate_u64_field(providers, "providers.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ConfigError::Invalid(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ConfigError::Invalid(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_partial_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({ "query": { "top_k": 5 } })).is_ok());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = validate_config(&json!({ "ingest": { "max_chars": 0 } })).unwrap_err();
        assert!(err.to_string().contains("ingest.max_chars"));
    }

    #[test]
    fn rejects_unknown_provider_kind() {
        let err = validate_config(&json!({ "providers": { "kind": "mystery" } })).unwrap_err();
        assert!(err.to_string().contains("providers.kind"));
    }

    #[test]
    fn reports_indexed_path_for_bad_array_items() {
        let err = validate_config(&json!({ "ingest": { "patterns": ["**/*.ts", 3] } }))
            .unwrap_err();
        assert!(err.to_string().contains("ingest.patterns[1]"));
    }

    #[test]
    fn rejects_non_object_sections() {
        assert!(validate_config(&json!({ "server": "localhost" })).is_err());
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
