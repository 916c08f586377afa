use super::ServiceConfig;
use crate::error::{BrainError, ErrorCode, ErrorExt, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Build the effective configuration: defaults, then `path` if given, then
/// environment overrides. The result is validated.
pub async fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path).await?,
        None => {
            debug!("No configuration file given, starting from defaults");
            ServiceConfig::default()
        }
    };

    config.merge_env_vars()?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML document on top of the defaults, without environment overrides
pub fn load_config_from_str(content: &str) -> Result<ServiceConfig> {
    toml::from_str(content).map_err(|e| {
        BrainError::config_with_code(
            ErrorCode::CONFIG_PARSE_ERROR,
            format!("Invalid configuration: {}", e.message()),
        )
        .with_source(e)
    })
}

async fn read_config_file(path: &Path) -> Result<ServiceConfig> {
    if !path.exists() {
        return Err(BrainError::config_with_code(
            ErrorCode::CONFIG_NOT_FOUND,
            format!("Configuration file not found: {}", path.display()),
        ));
    }

    let content = fs::read_to_string(path)
        .await
        .to_config_error(format!("Failed to read {}", path.display()))?;
    let config = load_config_from_str(&content)
        .map_err(|e| e.with_context(format!("while loading {}", path.display())))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupId;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = load_config_from_str(
            r#"
            port = 4100
            request_timeout = "2s"
            root_group_id = "root"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 4100);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.root_group_id, GroupId::from("root"));
        assert_eq!(config.task_service_url, ServiceConfig::default().task_service_url);
        assert_eq!(config.major_tasks.len(), 4);
    }

    #[test]
    fn test_major_tasks_from_toml() {
        let config = load_config_from_str(
            r#"
            [[major_tasks]]
            name = "Build"
            id = "t1"
            label = "Build"
            depth = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.major_tasks.len(), 1);
        assert_eq!(config.major_tasks[0].depth, Some(2));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = load_config_from_str("port = \"not a number\"").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_PARSE_ERROR);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string(&ServiceConfig::default()).unwrap();
        let parsed = load_config_from_str(&text).unwrap();
        assert_eq!(parsed, ServiceConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brain.toml");
        std::fs::write(&path, "group_service_url = \"http://groups:9000\"\n").unwrap();

        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config.group_service_url, "http://groups:9000");
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = read_config_file(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NOT_FOUND);
    }
}
