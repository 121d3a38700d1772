use crate::error::{Error, Result};
use crate::filter::FileFilterConfig;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

const DEFAULT_INPUT_DIR: &str = "input";
const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen2.5:14b";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the local inference endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Base URL of the inference service
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Request timeout for a single generation
    pub timeout: Duration,

    /// Sampling temperature, if overridden
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: None,
        }
    }
}

/// Configuration for the formatting pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory holding the raw markdown files
    pub input_dir: PathBuf,

    /// Directory receiving the formatted files
    pub output_dir: PathBuf,

    /// Which files in the input directory are processed
    pub file_filter_config: FileFilterConfig,

    /// Inference endpoint settings
    pub model: ModelConfig,

    /// Path to a prompt template replacing the built-in RAG template
    pub template_path: Option<PathBuf>,

    /// Dry run mode (format prompts only, no model calls or writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use rag_formatter::Config;
    ///
    /// let config = Config::builder()
    ///     .input_dir("./docs")
    ///     .model("llama3.1:8b")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// The input directory is not checked here: a missing input
    /// directory is reported by [`crate::Pipeline::run`] as
    /// [`Error::InputDirMissing`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Model name or endpoint is empty
    /// - Endpoint is not an http(s) URL
    /// - Timeout is zero
    /// - Input and output directories are the same
    /// - Template path does not point to a file
    pub fn validate(&self) -> Result<()> {
        if self.model.model.trim().is_empty() {
            return Err(Error::config("model name must not be empty"));
        }

        let endpoint = self.model.endpoint.trim();
        if endpoint.is_empty() {
            return Err(Error::config("endpoint must not be empty"));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::config(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }

        if self.model.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than 0"));
        }

        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::config(format!(
                    "temperature ({temperature}) must be between 0.0 and 2.0"
                )));
            }
        }

        if resolve_dir(&self.input_dir) == resolve_dir(&self.output_dir) {
            return Err(Error::config(format!(
                "input and output directories must differ: {}",
                self.input_dir.display()
            )));
        }

        if let Some(ref template_path) = self.template_path {
            if !template_path.is_file() {
                return Err(Error::config(format!(
                    "Template file does not exist: {}",
                    template_path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Resolves a directory for identity checks: the canonical path when it
/// exists, otherwise the absolute path without `.` components.
fn resolve_dir(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_filter_config: FileFilterConfig::default(),
            model: ModelConfig::default(),
            template_path: None,
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    file_filter_config: Option<FileFilterConfig>,
    endpoint: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    temperature: Option<f32>,
    template_path: Option<PathBuf>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the directory holding the raw markdown files.
    #[must_use]
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Sets the directory receiving formatted files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets which input files are processed.
    #[must_use]
    pub fn file_filter_config(mut self, config: FileFilterConfig) -> Self {
        self.file_filter_config = Some(config);
        self
    }

    /// Sets the inference endpoint base URL.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the path to a prompt template file.
    ///
    /// The template must be valid Tera syntax and reference `{{ document }}`.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Enables dry run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = ModelConfig::default();
        let config = Config {
            input_dir: self
                .input_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            file_filter_config: self.file_filter_config.unwrap_or_default(),
            model: ModelConfig {
                endpoint: self.endpoint.unwrap_or(defaults.endpoint),
                model: self.model.unwrap_or(defaults.model),
                timeout: self.timeout.unwrap_or(defaults.timeout),
                temperature: self.temperature,
            },
            template_path: self.template_path,
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.model.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.timeout, Duration::from_secs(300));
        assert!(config.model.temperature.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_input_dir_is_not_a_config_error() {
        let config = Config::builder()
            .input_dir("/definitely/not/here")
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = Config::builder().model("  ").build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = Config::builder().endpoint("localhost:11434").build();
        assert!(result.is_err());

        let result = Config::builder().endpoint("https://llm.internal:8443").build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::builder().timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_temperature_range() {
        assert!(Config::builder().temperature(0.2).build().is_ok());
        assert!(Config::builder().temperature(3.5).build().is_err());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let result = Config::builder().input_dir("docs").output_dir("docs").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_same_directory_spelled_differently_rejected() {
        let result = Config::builder().input_dir("input").output_dir("./input").build();
        assert!(result.unwrap_err().is_config());

        let result = Config::builder().input_dir("docs/").output_dir("./docs").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_existing_directory_alias_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("input").create_dir_all().unwrap();

        let result = Config::builder()
            .input_dir(temp.path().join("input"))
            .output_dir(temp.path().join("input/./"))
            .build();
        assert!(result.is_err());

        let result = Config::builder()
            .input_dir(temp.path().join("input"))
            .output_dir(temp.path().join("input/outputs"))
            .build();
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_output_directory_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("input").create_dir_all().unwrap();
        std::os::unix::fs::symlink(temp.path().join("input"), temp.path().join("alias")).unwrap();

        let result = Config::builder()
            .input_dir(temp.path().join("input"))
            .output_dir(temp.path().join("alias"))
            .build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_missing_template_rejected() {
        let result = Config::builder().template_path("/no/such/template.tera").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_existing_template_accepted() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("prompt.tera");
        template.write_str("Format this: {{ document }}").unwrap();

        let config = Config::builder()
            .template_path(template.path())
            .build()
            .unwrap();
        assert_eq!(config.template_path.as_deref(), Some(template.path()));
    }
}
