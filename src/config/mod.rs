//! Configuration loading and management for Repo Grader
//!
//! Configuration is YAML on disk and plain structs in memory. Every section
//! has defaults, so an empty file (or no file at all) yields a working setup
//! that grades `.java` sources starting from 100 points.

use crate::domain::{GraderError, GraderResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File names searched in the working directory when no config is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] =
    ["repo_grader.yaml", "repo_grader.yml", ".repo_grader.yaml"];

/// Environment variable overriding `database.path`
pub const DATABASE_ENV: &str = "GRADER_DATABASE";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    /// Configuration format version
    pub version: String,
    pub sources: SourcesConfig,
    pub grading: GradingConfig,
    pub clone: CloneConfig,
    pub database: DatabaseConfig,
}

/// Which files in an assignment folder are graded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// File name suffixes to grade, each starting with '.'
    pub extensions: Vec<String>,
    /// .gitignore-style patterns skipped during collection
    pub exclude: Vec<String>,
}

/// Score arithmetic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Score before any deduction
    pub base_score: f64,
    /// Floor the final grade at zero
    pub clamp_at_zero: bool,
}

/// External git client invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    /// Program used to fetch repositories
    pub program: String,
    /// Seconds before a clone is abandoned
    pub timeout_secs: u64,
    /// Parent of the per-run working directories (system temp if unset)
    pub work_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            sources: SourcesConfig::default(),
            grading: GradingConfig::default(),
            clone: CloneConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".java".to_string()],
            exclude: vec![".git".to_string()],
        }
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            base_score: 100.0,
            clamp_at_zero: false,
        }
    }
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            timeout_secs: 120,
            work_root: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("grader.db"),
        }
    }
}

impl GraderConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GraderResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GraderError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GraderError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GraderResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GraderError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the explicit file, else the first default file found, else defaults
    pub fn discover(explicit: Option<&Path>) -> GraderResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        for name in DEFAULT_CONFIG_FILES {
            if Path::new(name).exists() {
                tracing::debug!("Using configuration from {}", name);
                return Self::load_from_file(name);
            }
        }

        Ok(Self::default())
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(DATABASE_ENV) {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }
        self
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GraderResult<()> {
        if self.version != "1.0" {
            return Err(GraderError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.sources.extensions.is_empty() {
            return Err(GraderError::config("sources.extensions must not be empty"));
        }

        for extension in &self.sources.extensions {
            if !extension.starts_with('.') || extension.len() < 2 {
                return Err(GraderError::config(format!(
                    "Invalid source extension '{extension}': expected a suffix like '.java'"
                )));
            }
        }

        for pattern in &self.sources.exclude {
            let raw = pattern.trim_start_matches('!').trim_end_matches('/');
            glob::Pattern::new(raw).map_err(|e| {
                GraderError::config(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
        }

        if !self.grading.base_score.is_finite() {
            return Err(GraderError::config("grading.base_score must be a finite number"));
        }

        if self.clone.timeout_secs == 0 {
            return Err(GraderError::config("clone.timeout_secs must be greater than zero"));
        }

        if self.clone.program.trim().is_empty() {
            return Err(GraderError::config("clone.program must not be empty"));
        }

        Ok(())
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> GraderResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GraderError::config(format!("Failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = GraderConfig::default();
        config.validate().unwrap();

        assert_eq!(config.sources.extensions, vec![".java"]);
        assert_eq!(config.grading.base_score, 100.0);
        assert!(!config.grading.clamp_at_zero);
        assert_eq!(config.clone.timeout_secs, 120);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = GraderConfig::load_from_str(
            "version: \"1.0\"\nsources:\n  extensions: [\".java\", \".kt\"]\ngrading:\n  clamp_at_zero: true\n",
        )
        .unwrap();

        assert_eq!(config.sources.extensions, vec![".java", ".kt"]);
        assert_eq!(config.sources.exclude, vec![".git"]);
        assert!(config.grading.clamp_at_zero);
        assert_eq!(config.grading.base_score, 100.0);
        assert_eq!(config.clone.program, "git");
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(GraderConfig::load_from_str("version: \"2.0\"").is_err());
        assert!(GraderConfig::load_from_str("sources:\n  extensions: []").is_err());
        assert!(GraderConfig::load_from_str("sources:\n  extensions: [\"java\"]").is_err());
        assert!(GraderConfig::load_from_str("sources:\n  exclude: [\"[bad\"]").is_err());
        assert!(GraderConfig::load_from_str("clone:\n  timeout_secs: 0").is_err());
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut config = GraderConfig::default();
        config.clone.timeout_secs = 30;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();

        let loaded = GraderConfig::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"grading:\n  base_score: 50\n").unwrap();

        let config = GraderConfig::discover(Some(file.path())).unwrap();
        assert_eq!(config.grading.base_score, 50.0);
    }
}
