use crate::{
    analyze::truncate_name,
    config::Config,
    error::{Error, Result},
    file::{file_name_of, load_document},
    model::{ModelClient, OllamaClient},
    scanner::Scanner,
    template::PromptFormatter,
    token::{TokenEstimator, TokenizerKind},
    writer::OutputWriter,
};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// What a successfully processed file produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Written output file, `None` in dry run mode
    pub output_path: Option<PathBuf>,
    /// Characters in the input document
    pub input_chars: usize,
    /// Characters in the model response (0 in dry run mode)
    pub output_chars: usize,
    /// Estimated tokens in the prompt sent to the model
    pub prompt_tokens: usize,
}

/// Result of processing one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Input file name
    pub file_name: String,
    /// Time spent on this file
    pub duration: Duration,
    /// Success details or the error of the stage that failed
    pub result: Result<Processed>,
}

impl FileOutcome {
    /// Returns true if the file was processed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// A file that failed, as reported in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Input file name
    pub file_name: String,
    /// Error message
    pub error: String,
}

/// Aggregate report of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Files attempted
    pub total_files: usize,

    /// Files formatted and written
    pub succeeded: usize,

    /// Files that failed at any stage
    pub failed: usize,

    /// Files in the input directory not matching the file patterns
    pub skipped: usize,

    /// Failed files with their error messages, in processing order
    pub failures: Vec<FileFailure>,

    /// Output files written
    pub outputs: Vec<PathBuf>,

    /// Estimated prompt tokens across all attempted prompts
    pub prompt_tokens: usize,

    /// Time spent on successful files
    pub processing_time: Duration,

    /// Total execution time
    pub duration: Duration,

    /// Output directory path
    pub output_directory: String,

    /// Model used for generation
    pub model: String,

    /// Whether model calls and writes were skipped
    pub dry_run: bool,

    /// Generation timestamp
    pub generated_at: String,
}

impl RunSummary {
    fn new(config: &Config) -> Self {
        Self {
            output_directory: config.output_dir.display().to_string(),
            model: config.model.model.clone(),
            dry_run: config.dry_run,
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            ..Self::default()
        }
    }

    /// Folds one file outcome into the summary.
    pub fn record(&mut self, outcome: FileOutcome) {
        self.total_files += 1;
        match outcome.result {
            Ok(processed) => {
                self.succeeded += 1;
                self.prompt_tokens += processed.prompt_tokens;
                self.processing_time += outcome.duration;
                if let Some(path) = processed.output_path {
                    self.outputs.push(path);
                }
            }
            Err(error) => {
                self.failed += 1;
                self.failures.push(FileFailure {
                    file_name: outcome.file_name,
                    error: error.to_string(),
                });
            }
        }
    }

    /// Returns true if any file failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Average time per successfully processed file.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn avg_file_duration(&self) -> Duration {
        if self.succeeded == 0 {
            Duration::ZERO
        } else {
            self.processing_time / self.succeeded as u32
        }
    }

    /// Returns the throughput in successfully processed files per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput_files_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.succeeded as f64 / secs
        }
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        if self.dry_run {
            println!("║              Dry Run Summary (no writes)              ║");
        } else {
            println!("║                 Processing Results                    ║");
        }
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Succeeded:            {:>8}   {:>8.2}s avg           ║",
            self.succeeded,
            self.avg_file_duration().as_secs_f64()
        );
        println!(
            "║ Failed:               {:>8}                        ║",
            self.failed
        );
        println!(
            "║ Skipped:              {:>8}                        ║",
            self.skipped
        );
        println!(
            "║ Total Files:          {:>8}   {:>8.2}s total         ║",
            self.total_files,
            self.duration.as_secs_f64()
        );
        println!(
            "║ Prompt Tokens (est.): {:>8}                        ║",
            self.prompt_tokens
        );
        println!("║                                                       ║");
        println!("║ Model: {} ║", fit_cell(&self.model, 46));
        println!("║ Output Directory:                                     ║");
        println!("║   {} ║", fit_cell(&self.output_directory, 51));
        if !self.failures.is_empty() {
            println!("╠═══════════════════════════════════════════════════════╣");
            println!("║ Failures:                                             ║");
            for failure in &self.failures {
                println!("║   {}: {}", failure.file_name, failure.error);
            }
        }
        println!("╚═══════════════════════════════════════════════════════╝\n");

        if self.succeeded > 0 && !self.dry_run {
            println!(
                "Processing rate: {:.2} files/second",
                self.throughput_files_per_sec()
            );
        }
    }
}

/// Pads or truncates `text` to exactly `width` characters.
fn fit_cell(text: &str, width: usize) -> String {
    let text = if text.chars().count() > width {
        truncate_name(text, width.saturating_sub(3))
    } else {
        text.to_string()
    };
    format!("{text:<width$}")
}

/// Sequential driver: load, format, generate, write, one file at a time.
pub struct Pipeline<M = OllamaClient> {
    config: Config,
    scanner: Scanner,
    formatter: PromptFormatter,
    model: M,
    writer: OutputWriter,
    estimator: Arc<dyn TokenEstimator>,
}

impl Pipeline<OllamaClient> {
    /// Creates a pipeline talking to the configured inference endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation, template loading or
    /// HTTP client construction fails.
    pub fn new(config: Config) -> Result<Self> {
        let model = OllamaClient::new(&config.model)?;
        Self::with_model(config, model)
    }
}

impl<M: ModelClient> Pipeline<M> {
    /// Creates a pipeline with a caller-supplied model client.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation or template loading fails.
    pub fn with_model(config: Config, model: M) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config)?;
        let formatter = PromptFormatter::new(&config)?;
        let writer = OutputWriter::new(&config.output_dir);

        Ok(Self {
            config,
            scanner,
            formatter,
            model,
            writer,
            estimator: TokenizerKind::default().create(),
        })
    }

    /// Processes every matching file in the input directory.
    ///
    /// Per-file failures are recorded in the returned summary and never stop
    /// the loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputDirMissing`] before any file is processed if the
    /// input directory does not exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rag_formatter::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .input_dir("./input")
    ///     .output_dir("./outputs")
    ///     .build()?;
    ///
    /// let summary = Pipeline::new(config)?.run()?;
    /// summary.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(input_dir = %self.scanner.input_dir().display()))]
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(&self.config);

        let (files, skipped) = self.scanner.scan_counted()?;
        summary.skipped = skipped;

        if files.is_empty() {
            warn!("No matching files found in {}", self.scanner.input_dir().display());
            summary.duration = start_time.elapsed();
            return Ok(summary);
        }

        info!("Found {} files to process", files.len());
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping model calls and file writes");
        }

        for (index, path) in files.iter().enumerate() {
            debug!("[{}/{}] {}", index + 1, files.len(), path.display());
            let outcome = self.process(path);

            match &outcome.result {
                Ok(_) => info!(
                    "✓ Processed: {} ({:.2}s)",
                    outcome.file_name,
                    outcome.duration.as_secs_f64()
                ),
                Err(e) => warn!("✗ Failed to process {}: {}", outcome.file_name, e),
            }

            summary.record(outcome);
        }

        summary.duration = start_time.elapsed();

        info!(
            "Finished in {:.2}s: {} succeeded, {} failed",
            summary.duration.as_secs_f64(),
            summary.succeeded,
            summary.failed
        );

        Ok(summary)
    }

    /// Runs one file through every stage and captures the outcome.
    fn process(&self, path: &Path) -> FileOutcome {
        let start = Instant::now();
        let result = self.process_file(path);

        FileOutcome {
            file_name: file_name_of(path),
            duration: start.elapsed(),
            result,
        }
    }

    fn process_file(&self, path: &Path) -> Result<Processed> {
        let document = load_document(path)?;
        let prompt = self.formatter.format_document(&document)?;
        let prompt_tokens = self.estimator.estimate(&prompt);
        let input_chars = document.char_count();

        if self.config.dry_run {
            debug!("{}: prompt of ~{} tokens", document.file_name, prompt_tokens);
            return Ok(Processed {
                output_path: None,
                input_chars,
                output_chars: 0,
                prompt_tokens,
            });
        }

        let response = self.model.generate(&prompt)?;
        let output_chars = response.chars().count();

        // A reformatted document should be about as long as its input.
        if output_chars.saturating_mul(5) < input_chars.saturating_mul(4) {
            warn!(
                "Response for {} may be truncated (input: {} chars, output: {} chars)",
                document.file_name, input_chars, output_chars
            );
        }

        let output_path = self.writer.write(&document.raw_file_name, &response)?;

        Ok(Processed {
            output_path: Some(output_path),
            input_chars,
            output_chars,
            prompt_tokens,
        })
    }
}
