//! # rag-formatter
//!
//! Batch reformatting of markdown documentation into a RAG-friendly schema
//! using a locally hosted language model.
//!
//! ## Features
//!
//! - Fixed RAG template with optional user-supplied Tera override
//! - Blocking client for Ollama-compatible inference endpoints
//! - Per-file failure isolation with a summarized run report
//! - Atomic output writes, re-runs overwrite in place
//! - Context-window analysis of input documents
//!
//! ## Quick Start
//!
//! ```no_run
//! use rag_formatter::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input_dir("./input")
//!     .output_dir("./outputs")
//!     .model("qwen2.5:14b")
//!     .build()?;
//!
//! let summary = Pipeline::new(config)?.run()?;
//! summary.print_summary();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Every file passes through the same stages, one file at a time:
//! 1. **Scanner**: Lists matching files in the input directory
//! 2. **Loader**: Reads each file as UTF-8 text
//! 3. **Formatter**: Embeds the text into the RAG prompt template
//! 4. **Model client**: Sends the prompt and collects the response
//! 5. **Writer**: Persists the response under the input file's name

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod analyze;
mod config;
mod error;
mod file;
mod filter;
mod model;
mod pipeline;
mod scanner;
mod template;
mod template_validator;
mod token;
mod writer;

pub use analyze::{
    analyze_directory, analyze_with_outputs, count_code_blocks, count_lines, AnalysisReport,
    FileStats, ModelFit, ModelWindow, MODEL_WINDOWS,
};
pub use config::{Config, ConfigBuilder, ModelConfig};
pub use error::{Error, Result};
pub use file::{load_document, Document};
pub use filter::FileFilterConfig;
pub use model::{ModelClient, OllamaClient};
pub use pipeline::{FileFailure, FileOutcome, Pipeline, Processed, RunSummary};
pub use template::PromptFormatter;
pub use token::{TokenEstimator, TokenizerKind};
pub use writer::OutputWriter;

/// Runs the complete formatting pipeline against the configured endpoint.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The template cannot be loaded
/// - The input directory doesn't exist
///
/// Failures of individual files are reported in the returned [`RunSummary`].
///
/// # Examples
///
/// ```no_run
/// use rag_formatter::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let summary = run(Config::builder().build()?)?;
/// assert!(!summary.has_failures());
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RunSummary> {
    Pipeline::new(config)?.run()
}
