//! File selection for the input directory.
//!
//! Patterns are matched against the file name only, since the input
//! directory is never walked recursively.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

const DEFAULT_INCLUDE: &str = "*.md";

/// Configuration for file selection with glob patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilterConfig {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            include: vec![DEFAULT_INCLUDE.to_string()],
            exclude: Vec::new(),
        }
    }
}

impl FileFilterConfig {
    /// Creates the default configuration (`*.md`, nothing excluded).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the include patterns. An empty list keeps the default.
    #[must_use]
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.include = patterns;
        }
        self
    }

    /// Sets patterns for files to skip even when included.
    #[must_use]
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid glob.
    pub(crate) fn new(config: &FileFilterConfig) -> Result<Self> {
        Ok(Self {
            include: Self::build_globset(&config.include)?,
            exclude: Self::build_globset(&config.exclude)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    pub(crate) fn should_process(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = Path::new(name);

        self.include.is_match(name) && !self.exclude.is_match(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_markdown_only() {
        let filter = FileFilter::new(&FileFilterConfig::default()).unwrap();

        assert!(filter.should_process(Path::new("input/button.md")));
        assert!(!filter.should_process(Path::new("input/notes.txt")));
        assert!(!filter.should_process(Path::new("input/readme.markdown")));
    }

    #[test]
    fn test_custom_include_patterns() {
        let config = FileFilterConfig::new().include(vec!["*.md".into(), "*.mdx".into()]);
        let filter = FileFilter::new(&config).unwrap();

        assert!(filter.should_process(Path::new("card.mdx")));
        assert!(filter.should_process(Path::new("card.md")));
        assert!(!filter.should_process(Path::new("card.tsx")));
    }

    #[test]
    fn test_empty_include_keeps_default() {
        let config = FileFilterConfig::new().include(Vec::new());
        assert_eq!(config, FileFilterConfig::default());
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let config = FileFilterConfig::new().exclude(vec!["draft-*".into()]);
        let filter = FileFilter::new(&config).unwrap();

        assert!(!filter.should_process(Path::new("draft-slider.md")));
        assert!(filter.should_process(Path::new("slider.md")));
    }

    #[test]
    fn test_patterns_match_file_name_not_directory() {
        let config = FileFilterConfig::new().exclude(vec!["input".into()]);
        let filter = FileFilter::new(&config).unwrap();

        assert!(filter.should_process(Path::new("input/a.md")));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = FileFilterConfig::new().include(vec!["[".into()]);
        let err = FileFilter::new(&config).unwrap_err();
        assert!(err.is_config());
    }
}
