//! Service configuration
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables. Validation runs once everything is merged.

pub mod loader;

pub use loader::{load_config, load_config_from_str};

use crate::error::{BrainError, ErrorCode, Result};
use crate::model::GroupId;
use crate::statistics::{FieldSchema, MajorTask};
use humantime_serde::re::humantime::parse_duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub task_service_url: String,
    pub group_service_url: String,
    /// Timeout of every upstream request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub root_group_id: GroupId,
    /// Category of the live value appended to timelines
    pub timeline_current_label: String,
    pub major_tasks: Vec<MajorTask>,
    pub fields: FieldSchema,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            task_service_url: "http://localhost:3001".to_string(),
            group_service_url: "http://localhost:3002".to_string(),
            request_timeout: Duration::from_secs(30),
            root_group_id: GroupId::from("5db805a8216dad5ed3b9efbf"),
            timeline_current_label: "current".to_string(),
            major_tasks: MajorTask::defaults(),
            fields: FieldSchema::default(),
        }
    }
}

impl ServiceConfig {
    /// Apply overrides from the process environment
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(address) = lookup("BRAIN_BIND_ADDRESS") {
            self.bind_address = address;
        }

        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| {
                BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("PORT must be a port number, got '{}'", port),
                )
            })?;
        }

        if let Some(url) = lookup("TASK_SERVICE_URL") {
            self.task_service_url = url;
        }

        if let Some(url) = lookup("GROUP_SERVICE_URL") {
            self.group_service_url = url;
        }

        if let Some(timeout) = lookup("BRAIN_REQUEST_TIMEOUT") {
            self.request_timeout = parse_duration(&timeout).map_err(|e| {
                BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("BRAIN_REQUEST_TIMEOUT is not a duration: '{}'", timeout),
                )
                .with_source(e)
            })?;
        }

        if let Some(root) = lookup("ROOT_ANCESTOR_ID") {
            self.root_group_id = GroupId::from(root);
        }

        if let Some(version) = lookup("BRAIN_FIELD_SCHEMA") {
            self.fields = FieldSchema::builtin(&version).ok_or_else(|| {
                BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("Unknown field schema '{}' (expected v1 or v2)", version),
                )
            })?;
        }

        debug!("Configuration after environment overrides: {:?}", self);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_service_url("task_service_url", &self.task_service_url)?;
        validate_service_url("group_service_url", &self.group_service_url)?;
        self.fields.validate()?;

        let mut seen = HashSet::new();
        for major in &self.major_tasks {
            if !seen.insert(&major.id) {
                return Err(BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("Major task id '{}' is configured twice", major.id),
                ));
            }
        }

        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            BrainError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("bind_address '{}' is not an IP address", self.bind_address),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn validate_service_url(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| {
        BrainError::config_with_code(
            ErrorCode::CONFIG_INVALID_URL,
            format!("{} '{}' is not a valid URL", key, value),
        )
        .with_source(e)
    })?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        _ => Err(BrainError::config_with_code(
            ErrorCode::CONFIG_INVALID_URL,
            format!("{} '{}' must be an absolute http(s) URL", key, value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.major_tasks.len(), 4);
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .merge_env_from(env(&[
                ("PORT", "8080"),
                ("TASK_SERVICE_URL", "http://tasks:4000"),
                ("BRAIN_REQUEST_TIMEOUT", "5s"),
                ("ROOT_ANCESTOR_ID", "root"),
                ("BRAIN_FIELD_SCHEMA", "v1"),
            ]))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.task_service_url, "http://tasks:4000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.root_group_id, GroupId::from("root"));
        assert_eq!(config.fields.version, "v1");
    }

    #[test]
    fn test_bad_env_values_are_config_errors() {
        let mut config = ServiceConfig::default();
        let err = config.merge_env_from(env(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);

        let err = config
            .merge_env_from(env(&[("BRAIN_FIELD_SCHEMA", "v7")]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_validation_rejects_relative_urls_and_duplicate_majors() {
        let mut config = ServiceConfig::default();
        config.group_service_url = "groups:3002".to_string();
        assert_eq!(
            config.validate().unwrap_err().code(),
            ErrorCode::CONFIG_INVALID_URL
        );

        let mut config = ServiceConfig::default();
        let first = config.major_tasks[0].clone();
        config.major_tasks.push(first);
        assert_eq!(
            config.validate().unwrap_err().code(),
            ErrorCode::CONFIG_INVALID_VALUE
        );
    }
}
