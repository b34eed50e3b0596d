//! Configuration types for the listing pipeline and the feature enricher.
//!
//! Both configurations use the builder pattern and can be deserialized from
//! JSON (e.g. a `--config` file passed to the CLI).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schema::{LOCATION, TITLE};

/// Configuration for the preprocessing pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use aqar_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .missing_markers(["N/A", "", "-"])
///     .scale_numeric(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Textual markers meaning "no value", compared after trimming.
    /// Default: `["N/A", ""]`
    pub missing_markers: Vec<String>,

    /// Leading regional prefix stripped from `Location` (followed by `/`).
    /// Default: "Greater Cairo"
    pub region_prefix: String,

    /// Column-name prefix identifying positional-index artifacts to drop.
    /// Default: "Unnamed:"
    pub index_artifact_prefix: String,

    /// Standardize Price, Price/m² and Area after imputation.
    /// Default: false
    pub scale_numeric: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            missing_markers: vec!["N/A".to_string(), String::new()],
            region_prefix: "Greater Cairo".to_string(),
            index_artifact_prefix: "Unnamed:".to_string(),
            scale_numeric: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.index_artifact_prefix.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue(
                "index_artifact_prefix".to_string(),
            ));
        }
        if self.region_prefix.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue("region_prefix".to_string()));
        }
        Ok(())
    }
}

/// Configuration for the NLP feature enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Vocabulary cap for each TF-IDF block.
    /// Default: 30
    pub tfidf_max_features: usize,

    /// Number of texts sent to the embedding model per call.
    /// Default: 64
    pub embedding_batch_size: usize,

    /// Text columns to vectorize, in output order, with their column prefix.
    /// Default: `[("Location", "loc"), ("Title", "title")]`
    pub text_columns: Vec<TextColumn>,
}

/// A source text column and the prefix used to name its feature columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextColumn {
    pub column: String,
    pub prefix: String,
}

impl TextColumn {
    pub fn new(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            prefix: prefix.into(),
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            tfidf_max_features: 30,
            embedding_batch_size: 64,
            text_columns: vec![TextColumn::new(LOCATION, "loc"), TextColumn::new(TITLE, "title")],
        }
    }
}

impl EnrichConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EnrichConfigBuilder {
        EnrichConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.tfidf_max_features == 0 {
            return Err(ConfigValidationError::ZeroValue(
                "tfidf_max_features".to_string(),
            ));
        }
        if self.embedding_batch_size == 0 {
            return Err(ConfigValidationError::ZeroValue(
                "embedding_batch_size".to_string(),
            ));
        }
        if self.text_columns.is_empty() {
            return Err(ConfigValidationError::EmptyValue("text_columns".to_string()));
        }
        let mut prefixes: Vec<&str> = self.text_columns.iter().map(|c| c.prefix.as_str()).collect();
        prefixes.sort_unstable();
        if let Some(dup) = prefixes.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigValidationError::DuplicatePrefix(dup[0].to_string()));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must not be empty")]
    EmptyValue(String),

    #[error("'{0}' must be at least 1")]
    ZeroValue(String),

    #[error("Feature prefix '{0}' is used by more than one text column")]
    DuplicatePrefix(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    missing_markers: Option<Vec<String>>,
    region_prefix: Option<String>,
    index_artifact_prefix: Option<String>,
    scale_numeric: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the textual markers treated as missing values.
    pub fn missing_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Set the regional prefix stripped from the start of `Location`.
    pub fn region_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.region_prefix = Some(prefix.into());
        self
    }

    /// Set the column-name prefix that marks index artifacts.
    pub fn index_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_artifact_prefix = Some(prefix.into());
        self
    }

    /// Enable or disable standardization of the continuous columns.
    pub fn scale_numeric(mut self, scale: bool) -> Self {
        self.scale_numeric = Some(scale);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            missing_markers: self.missing_markers.unwrap_or(defaults.missing_markers),
            region_prefix: self.region_prefix.unwrap_or(defaults.region_prefix),
            index_artifact_prefix: self
                .index_artifact_prefix
                .unwrap_or(defaults.index_artifact_prefix),
            scale_numeric: self.scale_numeric.unwrap_or(defaults.scale_numeric),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`EnrichConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EnrichConfigBuilder {
    tfidf_max_features: Option<usize>,
    embedding_batch_size: Option<usize>,
    text_columns: Option<Vec<TextColumn>>,
}

impl EnrichConfigBuilder {
    /// Set the TF-IDF vocabulary cap.
    pub fn tfidf_max_features(mut self, max_features: usize) -> Self {
        self.tfidf_max_features = Some(max_features);
        self
    }

    /// Set the embedding batch size.
    pub fn embedding_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = Some(batch_size);
        self
    }

    /// Set the text columns to vectorize.
    pub fn text_columns(mut self, columns: Vec<TextColumn>) -> Self {
        self.text_columns = Some(columns);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<EnrichConfig, ConfigValidationError> {
        let defaults = EnrichConfig::default();
        let config = EnrichConfig {
            tfidf_max_features: self
                .tfidf_max_features
                .unwrap_or(defaults.tfidf_max_features),
            embedding_batch_size: self
                .embedding_batch_size
                .unwrap_or(defaults.embedding_batch_size),
            text_columns: self.text_columns.unwrap_or(defaults.text_columns),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.missing_markers, vec!["N/A".to_string(), String::new()]);
        assert_eq!(config.region_prefix, "Greater Cairo");
        assert_eq!(config.index_artifact_prefix, "Unnamed:");
        assert!(!config.scale_numeric);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .missing_markers(["N/A", "-"])
            .scale_numeric(true)
            .build()
            .unwrap();

        assert_eq!(config.missing_markers, vec!["N/A".to_string(), "-".to_string()]);
        assert!(config.scale_numeric);
        assert_eq!(config.region_prefix, "Greater Cairo");
    }

    #[test]
    fn test_validation_empty_artifact_prefix() {
        let result = PipelineConfig::builder().index_artifact_prefix("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyValue(field) if field == "index_artifact_prefix"
        ));
    }

    #[test]
    fn test_enrich_defaults() {
        let config = EnrichConfig::builder().build().unwrap();
        assert_eq!(config.tfidf_max_features, 30);
        assert_eq!(config.text_columns[0], TextColumn::new("Location", "loc"));
        assert_eq!(config.text_columns[1], TextColumn::new("Title", "title"));
    }

    #[test]
    fn test_enrich_validation() {
        assert!(matches!(
            EnrichConfig::builder().tfidf_max_features(0).build(),
            Err(ConfigValidationError::ZeroValue(_))
        ));
        assert!(matches!(
            EnrichConfig::builder().embedding_batch_size(0).build(),
            Err(ConfigValidationError::ZeroValue(_))
        ));
        assert!(matches!(
            EnrichConfig::builder()
                .text_columns(vec![TextColumn::new("Title", "t"), TextColumn::new("Location", "t")])
                .build(),
            Err(ConfigValidationError::DuplicatePrefix(p)) if p == "t"
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{ "missing_markers": ["N/A", "", "--"], "scale_numeric": true }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.missing_markers.len(), 3);
        assert!(config.scale_numeric);
        assert_eq!(config.index_artifact_prefix, "Unnamed:");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = EnrichConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EnrichConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
