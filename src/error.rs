use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the rag-formatter library.
///
/// `Read`, `Template`, `Model` and `Write` are per-file errors: the pipeline
/// records them against the offending file and keeps going. `InputDirMissing`
/// and `Config` abort a run before any file is touched.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Input file missing, not a regular file, or not valid UTF-8.
    #[error("Failed to read '{path}': {message}")]
    Read {
        /// Path of the input file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Inference endpoint unreachable, timed out, or returned a failure.
    #[error("Model request failed: {message}")]
    Model {
        /// Error message
        message: String,
    },

    /// Output directory or file not writable.
    #[error("Failed to write '{path}': {message}")]
    Write {
        /// Path that could not be written
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering or compilation error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// The input directory does not exist or is not a directory.
    #[error("Input directory not found: '{path}'")]
    InputDirMissing {
        /// Directory that was expected
        path: PathBuf,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates a read error with path context.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a read error from an IO error, reporting bad encodings distinctly.
    #[must_use]
    pub fn read_io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        let message = if source.kind() == std::io::ErrorKind::InvalidData {
            "file is not valid UTF-8 text".to_string()
        } else {
            source.to_string()
        };
        Self::read(path, message)
    }

    /// Creates a model error.
    #[must_use]
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Creates a write error with path context.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // Tera hides the useful part of the message in the source chain.
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates a template validation error.
    #[must_use]
    pub fn template_validation(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Creates an input directory missing error.
    #[must_use]
    pub fn input_dir_missing(path: impl Into<PathBuf>) -> Self {
        Self::InputDirMissing { path: path.into() }
    }

    /// Returns true if this is a read error.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns true if this is a model error.
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model { .. })
    }

    /// Returns true if this is a write error.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this error aborts the whole run rather than one file.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InputDirMissing { .. } | Self::Config { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("endpoint unreachable: {e}")
        } else if e.is_decode() {
            format!("invalid response body: {e}")
        } else {
            e.to_string()
        };
        Self::Model { message }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
