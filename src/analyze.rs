//! Context size analysis for markdown inputs.
//!
//! Reports how large each document is and whether it fits the context
//! window of common local models, before any model is called.

use crate::{
    error::Result,
    file::{file_name_of, load_document},
    filter::FileFilterConfig,
    scanner::Scanner,
    token::{count_words, TokenEstimator},
};
use memchr::memmem;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

static FENCE: Lazy<memmem::Finder<'static>> = Lazy::new(|| memmem::Finder::new("```"));

/// Percent of a context window a document may use and still fit comfortably.
const COMFORTABLE_PERCENT: usize = 70;
/// Percent of a context window above which a document is considered too large.
const TIGHT_PERCENT: usize = 90;

/// A model name and its context window in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelWindow {
    /// Model identifier as used by the inference endpoint
    pub name: &'static str,
    /// Context window size in tokens
    pub context_tokens: usize,
}

impl ModelWindow {
    /// Whether `tokens` stays within `percent` of this window.
    #[must_use]
    pub const fn holds(&self, tokens: usize, percent: usize) -> bool {
        tokens.saturating_mul(100) <= self.context_tokens.saturating_mul(percent)
    }
}

/// Context windows of commonly used local models.
pub const MODEL_WINDOWS: &[ModelWindow] = &[
    ModelWindow { name: "llama3.1:8b", context_tokens: 128_000 },
    ModelWindow { name: "llama3.1:70b", context_tokens: 128_000 },
    ModelWindow { name: "qwen2.5:14b", context_tokens: 32_768 },
    ModelWindow { name: "mistral-nemo:12b", context_tokens: 128_000 },
    ModelWindow { name: "phi3.5:3.8b", context_tokens: 128_000 },
    ModelWindow { name: "gemma2:9b", context_tokens: 8_192 },
    ModelWindow { name: "codellama:13b", context_tokens: 16_384 },
];

/// How well a document fits the known model context windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFit {
    /// Under 70% of at least one model's window
    Comfortable,
    /// Between 70% and 90% of the largest fitting window
    Tight,
    /// Over 90% of every known window
    TooLarge,
}

impl ModelFit {
    /// Classifies an estimated token count against [`MODEL_WINDOWS`].
    #[must_use]
    pub fn classify(tokens: usize) -> Self {
        let fits = |percent| MODEL_WINDOWS.iter().any(|w| w.holds(tokens, percent));

        if fits(COMFORTABLE_PERCENT) {
            Self::Comfortable
        } else if fits(TIGHT_PERCENT) {
            Self::Tight
        } else {
            Self::TooLarge
        }
    }

    /// Short marker for tabular output.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Comfortable => "ok",
            Self::Tight => "tight",
            Self::TooLarge => "too large",
        }
    }
}

/// Size figures for one markdown document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStats {
    /// File name
    pub file_name: String,
    /// Size on disk in KiB
    pub size_kb: f64,
    /// Unicode scalar count
    pub characters: usize,
    /// Characters excluding spaces, tabs and newlines
    pub characters_no_spaces: usize,
    /// Whitespace-separated words
    pub words: usize,
    /// Line count
    pub lines: usize,
    /// Fenced code blocks
    pub code_blocks: usize,
    /// Estimated token count
    pub estimated_tokens: usize,
    /// Context window verdict
    pub fit: ModelFit,
    /// Models whose window holds the document comfortably
    pub comfortable_models: Vec<&'static str>,
}

impl FileStats {
    /// Computes statistics for a document's text.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_text(
        file_name: impl Into<String>,
        content: &str,
        size_bytes: u64,
        estimator: &dyn TokenEstimator,
    ) -> Self {
        let estimated_tokens = estimator.estimate(content);
        let comfortable_models = MODEL_WINDOWS
            .iter()
            .filter(|w| w.holds(estimated_tokens, COMFORTABLE_PERCENT))
            .map(|w| w.name)
            .collect();

        Self {
            file_name: file_name.into(),
            size_kb: (size_bytes as f64 / 1024.0 * 100.0).round() / 100.0,
            characters: content.chars().count(),
            characters_no_spaces: content
                .chars()
                .filter(|c| !matches!(c, ' ' | '\n' | '\t'))
                .count(),
            words: count_words(content),
            lines: count_lines(content),
            code_blocks: count_code_blocks(content),
            estimated_tokens,
            fit: ModelFit::classify(estimated_tokens),
            comfortable_models,
        }
    }
}

/// Counts lines, treating `\n`, `\r`, `\r\n` and the other Unicode line
/// separators as breaks. A trailing break does not start a new line.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(
            c,
            '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
        ) {
            if c == '\r' {
                chars.next_if_eq(&'\n');
            }
            lines += 1;
            open = false;
        } else {
            open = true;
        }
    }

    lines + usize::from(open)
}

/// Counts complete fenced code blocks (pairs of ```` ``` ```` fences).
#[must_use]
pub fn count_code_blocks(text: &str) -> usize {
    FENCE.find_iter(text.as_bytes()).count() / 2
}

/// Analysis of every markdown file in a directory.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Directory that was analyzed
    pub directory: String,
    /// Per-file statistics, in file name order
    pub files: Vec<FileStats>,
    /// Files that could not be read
    pub unreadable: usize,
}

impl AnalysisReport {
    /// Sum of a per-file figure across all files.
    fn total(&self, field: impl Fn(&FileStats) -> usize) -> usize {
        self.files.iter().map(field).sum()
    }

    /// Total estimated tokens across all files.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.total(|f| f.estimated_tokens)
    }

    /// Total size in KiB across all files.
    #[must_use]
    pub fn total_size_kb(&self) -> f64 {
        self.files.iter().map(|f| f.size_kb).sum()
    }

    /// Number of files that do not fit any known model comfortably.
    #[must_use]
    pub fn oversized(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.fit != ModelFit::Comfortable)
            .count()
    }

    /// Prints the per-file table, totals and averages to stdout.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_report(&self) {
        println!("\nContext size analysis: {}", self.directory);

        if self.files.is_empty() {
            println!("  No .md files found\n");
            return;
        }

        println!(
            "{:<24} {:>9} {:>10} {:>8} {:>7} {:>6} {:>10}  {}",
            "File", "Size(KB)", "Chars", "Words", "Lines", "Code", "Est.Tok", "Fit"
        );
        for f in &self.files {
            println!(
                "{:<24} {:>9.2} {:>10} {:>8} {:>7} {:>6} {:>10}  {}",
                truncate_name(&f.file_name, 20),
                f.size_kb,
                f.characters,
                f.words,
                f.lines,
                f.code_blocks,
                f.estimated_tokens,
                f.fit.symbol()
            );
        }

        let count = self.files.len();
        let avg = |total: usize| total / count;
        let chars = self.total(|f| f.characters);
        let words = self.total(|f| f.words);
        let lines = self.total(|f| f.lines);
        let blocks = self.total(|f| f.code_blocks);
        let tokens = self.total_tokens();

        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Summary Statistics                    ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ {:<14} {:>18} {:>18}  ║", "Metric", "Total", "Average");
        println!("║ {:<14} {:>18} {:>18}  ║", "Files", count, "-");
        println!(
            "║ {:<14} {:>18.2} {:>18.2}  ║",
            "Size (KB)",
            self.total_size_kb(),
            self.total_size_kb() / count as f64
        );
        println!("║ {:<14} {:>18} {:>18}  ║", "Characters", chars, avg(chars));
        println!("║ {:<14} {:>18} {:>18}  ║", "Words", words, avg(words));
        println!("║ {:<14} {:>18} {:>18}  ║", "Lines", lines, avg(lines));
        println!(
            "║ {:<14} {:>18} {:>18.1}  ║",
            "Code Blocks",
            blocks,
            blocks as f64 / count as f64
        );
        println!("║ {:<14} {:>18} {:>18}  ║", "Est. Tokens", tokens, avg(tokens));
        println!("╚═══════════════════════════════════════════════════════╝");
        println!("  ok = under 70% of a model's context, tight = 70-90%, too large = over 90%\n");
    }
}

pub(crate) fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let head: String = name.chars().take(max).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Analyzes every `*.md` file directly inside `dir`.
///
/// Files that cannot be read are logged and counted as unreadable.
///
/// # Errors
///
/// Returns an error if `dir` does not exist or is not a directory.
pub fn analyze_directory(dir: &Path, estimator: &dyn TokenEstimator) -> Result<AnalysisReport> {
    let scanner = Scanner::with_filter(dir, &FileFilterConfig::default())?;
    let paths = scanner.scan()?;

    let mut files = Vec::with_capacity(paths.len());
    let mut unreadable = 0;

    for path in &paths {
        match load_document(path) {
            Ok(doc) => {
                let size = std::fs::metadata(path).map_or(doc.content.len() as u64, |m| m.len());
                debug!("Analyzed {}", doc.file_name);
                files.push(FileStats::from_text(doc.file_name, &doc.content, size, estimator));
            }
            Err(e) => {
                warn!("Error analyzing {}: {}", file_name_of(path), e);
                unreadable += 1;
            }
        }
    }

    Ok(AnalysisReport {
        directory: dir.display().to_string(),
        files,
        unreadable,
    })
}

/// Analyzes `input_dir`, then `output_dir` when it exists, so formatted
/// documents can be compared with their sources.
///
/// # Errors
///
/// Returns an error if `input_dir` does not exist or is not a directory.
pub fn analyze_with_outputs(
    input_dir: &Path,
    output_dir: &Path,
    estimator: &dyn TokenEstimator,
) -> Result<Vec<AnalysisReport>> {
    let mut reports = vec![analyze_directory(input_dir, estimator)?];

    if output_dir.is_dir() && output_dir != input_dir {
        reports.push(analyze_directory(output_dir, estimator)?);
    } else {
        debug!("No output directory at {}", output_dir.display());
    }

    Ok(reports)
}
