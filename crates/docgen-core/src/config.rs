//! Pipeline configuration
//!
//! Loaded from TOML; every field has a compiled default so an empty file
//! (or no file) is valid. The API key is never part of the file.

use crate::error::ConfigError;
use docgen_ai::{Backoff, PromptSettings, RetryPolicy, DEFAULT_ENDPOINT};
use docgen_model::{BaseDataBuilder, MAX_RESPONSE_DAYS, MIN_RESPONSE_DAYS};
use docgen_render::{TemplateCache, TemplateRenderer, TemplateSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocgenConfig {
    /// First filename component, e.g. `au` in `au_letter_of_demand_1a2b3c4d`
    pub filename_prefix: String,
    /// Jurisdiction used when the input names none
    pub default_state: String,
    pub schema_version: String,
    pub default_response_days: u32,
    pub generation: GenerationConfig,
    pub templates: TemplatesConfig,
}

/// Text-generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible base URL
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Attempts after the first
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    pub request_timeout_secs: u64,
}

/// Template settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory overriding the bundled templates
    pub directory: Option<PathBuf>,
    pub cache_capacity: u64,
}

impl Default for DocgenConfig {
    fn default() -> Self {
        Self {
            filename_prefix: "au".to_string(),
            default_state: "VIC".to_string(),
            schema_version: "1.0".to_string(),
            default_response_days: 14,
            generation: GenerationConfig::default(),
            templates: TemplatesConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_retries: 2,
            base_delay_ms: 1000,
            max_jitter_ms: 250,
            request_timeout_secs: 60,
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: None,
            cache_capacity: 16,
        }
    }
}

impl DocgenConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// `Parse` on invalid TOML, `Validation` on out-of-range values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Validation` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| ConfigError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        };

        if self.filename_prefix.is_empty()
            || !self
                .filename_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(invalid(
                "filename_prefix",
                "must be non-empty ASCII letters, digits or '-'",
            ));
        }
        if !(MIN_RESPONSE_DAYS..=MAX_RESPONSE_DAYS).contains(&self.default_response_days) {
            return Err(invalid("default_response_days", "must be between 5 and 30"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(invalid("generation.temperature", "must be between 0.0 and 2.0"));
        }
        if self.generation.model.trim().is_empty() {
            return Err(invalid("generation.model", "must not be empty"));
        }
        if self.generation.request_timeout_secs == 0 {
            return Err(invalid("generation.request_timeout_secs", "must be positive"));
        }
        if self.templates.cache_capacity == 0 {
            return Err(invalid("templates.cache_capacity", "must be positive"));
        }
        Ok(())
    }

    /// With filename prefix
    #[inline]
    #[must_use]
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// With default jurisdiction
    #[inline]
    #[must_use]
    pub fn with_default_state(mut self, state: impl Into<String>) -> Self {
        self.default_state = state.into();
        self
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.generation.max_retries = max_retries;
        self
    }

    /// With backoff timing
    #[inline]
    #[must_use]
    pub fn with_backoff_ms(mut self, base_delay_ms: u64, max_jitter_ms: u64) -> Self {
        self.generation.base_delay_ms = base_delay_ms;
        self.generation.max_jitter_ms = max_jitter_ms;
        self
    }

    /// With template directory
    #[inline]
    #[must_use]
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates.directory = Some(dir.into());
        self
    }

    /// Base data builder for these settings
    #[must_use]
    pub fn base_builder(&self) -> BaseDataBuilder {
        BaseDataBuilder::new(self.default_state.clone(), self.schema_version.clone())
            .with_default_response_days(self.default_response_days)
    }

    /// Retry policy for section generation
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.generation.max_retries,
            Backoff::new(
                Duration::from_millis(self.generation.base_delay_ms),
                Duration::from_millis(self.generation.max_jitter_ms),
            ),
        )
    }

    /// Prompt settings for section generation
    #[must_use]
    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            model: self.generation.model.clone(),
            temperature: self.generation.temperature,
        }
    }

    /// Request timeout for the HTTP client
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }

    /// Template renderer for these settings
    #[must_use]
    pub fn renderer(&self) -> TemplateRenderer {
        let source = match &self.templates.directory {
            Some(dir) => TemplateSource::Directory(dir.clone()),
            None => TemplateSource::Embedded,
        };
        TemplateRenderer::new(source).with_cache(TemplateCache::new(self.templates.cache_capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(DocgenConfig::from_toml_str("").unwrap(), DocgenConfig::default());
    }

    #[test]
    fn demo_config_matches_defaults() {
        let demo = include_str!("../../../demos/docgen.toml");
        assert_eq!(DocgenConfig::from_toml_str(demo).unwrap(), DocgenConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = DocgenConfig::from_toml_str(
            r#"
            filename_prefix = "nz"
            default_state = "NSW"

            [generation]
            model = "gpt-4o-mini"
            max_retries = 4

            [templates]
            directory = "/srv/templates"
            "#,
        )
        .unwrap();
        assert_eq!(config.filename_prefix, "nz");
        assert_eq!(config.default_state, "NSW");
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.max_retries, 4);
        assert_eq!(config.generation.base_delay_ms, 1000);
        assert_eq!(
            config.templates.directory.as_deref(),
            Some(Path::new("/srv/templates"))
        );
        assert_eq!(config.templates.cache_capacity, 16);
    }

    #[test]
    fn rejects_bad_values() {
        let err = DocgenConfig::from_toml_str("default_response_days = 60").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "default_response_days"
        ));

        let err = DocgenConfig::from_toml_str("filename_prefix = \"a/b\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            DocgenConfig::from_toml_str("[generation"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docgen.toml");
        std::fs::write(&path, "[generation]\ntemperature = 0.0\n").unwrap();
        let config = DocgenConfig::load(&path).unwrap();
        assert_eq!(config.generation.temperature, 0.0);

        assert!(matches!(
            DocgenConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn derived_components() {
        let config = DocgenConfig::new().with_max_retries(5).with_backoff_ms(10, 0);
        assert_eq!(config.retry_policy().max_retries(), 5);
        assert_eq!(
            config.retry_policy().backoff().delay(1),
            Duration::from_millis(20)
        );
        assert_eq!(config.prompt_settings().model, "gpt-4o");
    }
}
