//! Generation config loading and validation.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/activity_report_config.yaml";

/// Parameters for one report generation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Commits (and issues) sent per conversational turn.
    #[serde(default)]
    pub chunk_size: i64,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub gemini_model: String,
    /// Takes precedence over every environment credential when set.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Replaces the scheme and host of the backend URL.
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

impl GenerationConfig {
    /// Read and validate a YAML config file.
    ///
    /// Fails before anything touches the network: an empty path, a missing
    /// file, unparseable YAML or an invalid field all come back as
    /// [`ConfigError`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(path, &content)
    }

    fn from_yaml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants every later stage relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size <= 0 {
            return Err(ConfigError::NonPositiveChunkSize);
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::EmptyField("project_id"));
        }
        if self.location.trim().is_empty() {
            return Err(ConfigError::EmptyField("location"));
        }
        if self.gemini_model.trim().is_empty() {
            return Err(ConfigError::EmptyField("gemini_model"));
        }
        Ok(())
    }

    /// Chunk size as a slice length. Only meaningful after [`validate`](Self::validate).
    pub fn chunk_len(&self) -> usize {
        usize::try_from(self.chunk_size).unwrap_or(1).max(1)
    }

    /// Explicit credentials file, ignoring an empty string.
    pub fn credentials_path(&self) -> Option<&Path> {
        self.credentials_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}
