//! Configuration for structural schema checks.
//!
//! Defines the YAML-serializable configuration that controls where bare
//! schemas sit inside their document, which files are skipped, and how
//! reports are rendered.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! root_path: spec.validation.openAPIV3Schema
//! exclude:
//!   - kustomization.yaml
//! output:
//!   format: json
//! fail_fast: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use structural_schema_core::FieldPath;

use crate::error::Result;

/// Report rendering format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per violation (the default).
    #[default]
    Text,
    /// Pretty-printed JSON reports.
    Json,
    /// YAML reports.
    Yaml,
}

/// Settings controlling report output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Top-level check configuration.
///
/// Loaded from a YAML file (typically `.structural-check.yml`) and merged
/// with command-line flags by the CLI.
///
/// # Examples
///
/// ```
/// use structural_schema_loader::{CheckConfig, OutputFormat};
///
/// let config = CheckConfig::default();
/// assert_eq!(config.output.format, OutputFormat::Text);
/// assert!(config.root_field_path().is_root());
/// assert!(!config.fail_fast);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Dotted path prefix for errors in bare (non-CRD) schema documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,
    /// File names to skip when walking input directories.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Stop after the first file with violations.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            root_path: None,
            exclude: Vec::new(),
            output: OutputConfig::default(),
            fail_fast: false,
        }
    }
}

impl CheckConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::LoaderError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::LoaderError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// The configured root path, parsed.
    pub fn root_field_path(&self) -> FieldPath {
        self.root_path
            .as_deref()
            .map(FieldPath::from_dotted)
            .unwrap_or_default()
    }

    /// Returns `true` if a file with this name is in the exclusion list.
    ///
    /// # Examples
    ///
    /// ```
    /// # let yaml = r#"
    /// # version: "1.0"
    /// # exclude: [kustomization.yaml]
    /// # "#;
    /// # let config: structural_schema_loader::CheckConfig = serde_yaml::from_str(yaml).unwrap();
    /// assert!(config.is_excluded("kustomization.yaml"));
    /// assert!(!config.is_excluded("crd.yaml"));
    /// ```
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude.iter().any(|name| name == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
root_path: spec.validation.openAPIV3Schema
exclude:
  - kustomization.yaml
  - values.yaml
output:
  format: yaml
fail_fast: true
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: CheckConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.root_path.as_deref(), Some("spec.validation.openAPIV3Schema"));
        assert_eq!(config.exclude, vec!["kustomization.yaml", "values.yaml"]);
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: CheckConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(config.root_path.is_none());
        assert!(config.exclude.is_empty());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_root_field_path() {
        let config: CheckConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.root_field_path().to_string(), "spec.validation.openAPIV3Schema");
    }

    #[test]
    fn test_is_excluded() {
        let config: CheckConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_excluded("values.yaml"));
        assert!(!config.is_excluded("crd.yaml"));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = std::env::temp_dir().join(format!("ss_loader_test_config_rt_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");

        let original: CheckConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = CheckConfig::load(&path).unwrap();
        assert_eq!(loaded.version, original.version);
        assert_eq!(loaded.root_path, original.root_path);
        assert_eq!(loaded.exclude, original.exclude);
        assert_eq!(loaded.output.format, original.output.format);
        assert_eq!(loaded.fail_fast, original.fail_fast);

        std::fs::remove_dir_all(&dir).ok();
    }
}
