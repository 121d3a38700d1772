use anyhow::Context;
use clap::{Parser, Subcommand};
use rag_formatter::{analyze_directory, analyze_with_outputs, Config, FileFilterConfig, Pipeline, TokenizerKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "rag-formatter",
    version,
    author,
    about = "Reformat markdown documentation for RAG with a local language model",
    long_about = "Reformat markdown documentation into a RAG-friendly schema.\n\n\
    Every matching file in the input directory is embedded into a fixed prompt \
    template, sent to a locally hosted model, and the response is written to the \
    output directory under the same file name. A failing file is reported and \
    skipped; the rest of the batch still runs.\n\n\
    USAGE EXAMPLES:\n  \
      # Format ./input into ./outputs with the default model\n  \
      rag-formatter\n\n  \
      # Use another model and directories\n  \
      rag-formatter --input ./docs --output ./rag --model llama3.1:8b\n\n  \
      # Check which documents fit which context windows\n  \
      rag-formatter analyze ./docs\n\n  \
      # Render prompts without calling the model\n  \
      rag-formatter --dry-run -v"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory holding the raw markdown files
    #[arg(short, long, default_value = "input", value_name = "PATH", env = "RAG_FORMATTER_INPUT")]
    input: PathBuf,

    /// Directory receiving the formatted files
    #[arg(short, long, default_value = "outputs", value_name = "PATH", env = "RAG_FORMATTER_OUTPUT")]
    output: PathBuf,

    /// Model identifier on the inference endpoint
    #[arg(short, long, default_value = "qwen2.5:14b", env = "RAG_FORMATTER_MODEL")]
    model: String,

    /// Base URL of the Ollama-compatible endpoint
    #[arg(long, default_value = "http://localhost:11434", value_name = "URL", env = "RAG_FORMATTER_ENDPOINT")]
    endpoint: String,

    /// Timeout for a single generation, in seconds
    #[arg(long, default_value_t = 300, value_name = "SECS", env = "RAG_FORMATTER_TIMEOUT")]
    timeout: u64,

    /// Sampling temperature (0.0 - 2.0), model default if unset
    #[arg(long, env = "RAG_FORMATTER_TEMPERATURE")]
    temperature: Option<f32>,

    /// File name glob to process (can be used multiple times, default *.md)
    #[arg(short, long = "pattern", value_name = "GLOB")]
    patterns: Vec<String>,

    /// File name glob to skip (can be used multiple times)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Path to a Tera template replacing the built-in RAG prompt
    ///
    /// The template receives `document` (the file text) and `file_name`.
    ///
    /// Example: rag-formatter --template ./my-prompt.tera
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Dry run (render prompts only, no model calls or writes)
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report size, token estimate and model fit of each markdown file
    ///
    /// Without DIR, analyzes --input and then --output when it exists.
    Analyze {
        /// Single directory to analyze instead of --input and --output
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Tokenizer to use
        #[arg(long, value_enum, default_value = "technical")]
        tokenizer: CliTokenizer,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTokenizer {
    Simple,
    Technical,
}

impl From<CliTokenizer> for TokenizerKind {
    fn from(t: CliTokenizer) -> Self {
        match t {
            CliTokenizer::Simple => Self::Simple,
            CliTokenizer::Technical => Self::Technical,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    if let Some(Command::Analyze { dir, tokenizer }) = cli.command {
        let estimator = TokenizerKind::from(tokenizer).create();
        let reports = match dir {
            Some(dir) => vec![analyze_directory(&dir, estimator.as_ref())
                .with_context(|| format!("Failed to analyze {}", dir.display()))?],
            None => analyze_with_outputs(&cli.input, &cli.output, estimator.as_ref())
                .with_context(|| format!("Failed to analyze {}", cli.input.display()))?,
        };

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for report in &reports {
                report.print_report();
            }
        }
        return Ok(());
    }

    let mut builder = Config::builder()
        .input_dir(cli.input)
        .output_dir(cli.output)
        .model(cli.model)
        .endpoint(cli.endpoint)
        .timeout(Duration::from_secs(cli.timeout))
        .dry_run(cli.dry_run)
        .file_filter_config(
            FileFilterConfig::new()
                .include(cli.patterns)
                .exclude(cli.excludes),
        );

    if let Some(temperature) = cli.temperature {
        builder = builder.temperature(temperature);
    }

    if let Some(template_path) = cli.template {
        builder = builder.template_path(template_path);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let summary = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Pipeline execution failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print_summary();
    }

    if summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("rag_formatter=info"),
        1 => EnvFilter::new("rag_formatter=debug"),
        _ => EnvFilter::new("rag_formatter=trace"),
    };

    // stdout carries the summary, logs go to stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
