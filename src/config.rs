use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5678/webhook/job-application";

const DEFAULT_POSITIONS: [&str; 8] = [
    "Software Engineer",
    "Frontend Developer",
    "Backend Developer",
    "Data Analyst",
    "UI/UX Designer",
    "Product Manager",
    "HR Specialist",
    "Digital Marketing Specialist",
];

/// Startup configuration. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AppConfig {
    pub endpoint: String,
    pub job_positions: Vec<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            job_positions: DEFAULT_POSITIONS.iter().map(|p| p.to_string()).collect(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "apply").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads `path` if given (it must exist), else the default location if present,
    /// else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid endpoint '{}'", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("Endpoint must be http or https, got '{}'", url.scheme()));
        }

        if self.job_positions.is_empty() {
            return Err(anyhow!("jobPositions must list at least one position"));
        }
        let mut seen = HashSet::new();
        for position in &self.job_positions {
            if position.trim().is_empty() {
                return Err(anyhow!("jobPositions contains a blank entry"));
            }
            if !seen.insert(position.as_str()) {
                return Err(anyhow!("Duplicate job position '{}'", position));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.job_positions.len(), 8);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "endpoint": "https://n8n.example.com/webhook/apply" }"#);
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.endpoint, "https://n8n.example.com/webhook/apply");
        assert_eq!(config.job_positions, AppConfig::default().job_positions);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_file_positions_and_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "jobPositions": ["Barista", "Cashier"], "logLevel": "debug" }"#);
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.job_positions, vec!["Barista", "Cashier"]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "endpiont": "http://x" }"#);
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.endpoint = "ftp://example.com/x".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.job_positions = vec![];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.job_positions = vec!["A".to_string(), " ".to_string()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.job_positions = vec!["A".to_string(), "A".to_string()];
        assert!(config.validate().unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_endpoint_override() {
        let config = AppConfig::default()
            .with_endpoint(Some("https://hooks.example.com/a".to_string()))
            .unwrap();
        assert_eq!(config.endpoint, "https://hooks.example.com/a");
        assert!(AppConfig::default().with_endpoint(Some("nope".to_string())).is_err());
        assert_eq!(AppConfig::default().with_endpoint(None).unwrap(), AppConfig::default());
    }
}
