use crate::{
    config::Config,
    error::{Error, Result},
    filter::{FileFilter, FileFilterConfig},
};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Lists the files in the input directory that the pipeline should process.
pub(crate) struct Scanner {
    input_dir: PathBuf,
    file_filter: FileFilter,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a file pattern does not compile.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Self::with_filter(&config.input_dir, &config.file_filter_config)
    }

    /// Creates a scanner for an arbitrary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file pattern does not compile.
    pub(crate) fn with_filter(input_dir: &Path, filter: &FileFilterConfig) -> Result<Self> {
        Ok(Self {
            input_dir: input_dir.to_path_buf(),
            file_filter: FileFilter::new(filter)?,
        })
    }

    /// Returns matching files and symlinks directly inside the input
    /// directory, sorted by file name. Subdirectories are not descended into.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputDirMissing`] if the input directory does not
    /// exist or is not a directory.
    pub(crate) fn scan(&self) -> Result<Vec<PathBuf>> {
        self.scan_counted().map(|(files, _)| files)
    }

    /// Like [`Scanner::scan`], also returning how many files were left out
    /// by the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputDirMissing`] if the input directory does not
    /// exist or is not a directory, and [`Error::Read`] if it cannot be
    /// listed.
    pub(crate) fn scan_counted(&self) -> Result<(Vec<PathBuf>, usize)> {
        if !self.input_dir.is_dir() {
            return Err(Error::input_dir_missing(&self.input_dir));
        }

        debug!("Scanning {}", self.input_dir.display());

        // Every file counts, including hidden and git-ignored ones. Links are
        // listed unresolved so a broken one still reaches the loader.
        let walker = WalkBuilder::new(&self.input_dir)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        let mut skipped = 0;
        for result in walker {
            match result {
                Ok(entry)
                    if entry
                        .file_type()
                        .is_some_and(|ft| ft.is_file() || ft.is_symlink()) =>
                {
                    if self.file_filter.should_process(entry.path()) {
                        trace!("Selected {}", entry.path().display());
                        files.push(entry.into_path());
                    } else {
                        trace!("Skipping {}", entry.path().display());
                        skipped += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Walk error: {}", e);
                    return Err(Error::read(&self.input_dir, e.to_string()));
                }
            }
        }

        debug!("Found {} files to process, {} skipped", files.len(), skipped);
        Ok((files, skipped))
    }

    /// Returns the directory being scanned.
    pub(crate) fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn create_test_config(root: &Path) -> Config {
        Config::builder()
            .input_dir(root)
            .output_dir(root.join("outputs"))
            .build()
            .unwrap()
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_scanner_finds_markdown_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.md").write_str("second").unwrap();
        temp.child("a.md").write_str("first").unwrap();
        temp.child("notes.txt").write_str("ignored").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        let files = scanner.scan().unwrap();

        assert_eq!(names(&files), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_scanner_counts_skipped_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        temp.child("notes.txt").write_str("x").unwrap();
        temp.child("image.png").write_binary(&[0x89]).unwrap();
        temp.child("sub/b.md").write_str("b").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        let (files, skipped) = scanner.scan_counted().unwrap();

        assert_eq!(names(&files), vec!["a.md"]);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_scanner_is_not_recursive() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("top.md").write_str("top").unwrap();
        temp.child("nested/deep.md").write_str("deep").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        let files = scanner.scan().unwrap();

        assert_eq!(names(&files), vec!["top.md"]);
    }

    #[test]
    fn test_scanner_ignores_gitignore_and_hidden_rules() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("ignored.md\n").unwrap();
        temp.child("ignored.md").write_str("still processed").unwrap();
        temp.child(".hidden.md").write_str("also processed").unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        let files = scanner.scan().unwrap();

        assert_eq!(names(&files), vec![".hidden.md", "ignored.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_lists_dangling_symlink() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.md"), temp.path().join("b.md"))
            .unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        let files = scanner.scan().unwrap();

        assert_eq!(names(&files), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_scanner_empty_directory() {
        let temp = assert_fs::TempDir::new().unwrap();

        let scanner = Scanner::new(&create_test_config(temp.path())).unwrap();
        assert!(scanner.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scanner_missing_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = create_test_config(&temp.path().join("nope"));

        let scanner = Scanner::new(&config).unwrap();
        let err = scanner.scan().unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, Error::InputDirMissing { .. }));
    }

    #[test]
    fn test_scanner_uses_custom_patterns() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.md").write_str("a").unwrap();
        temp.child("b.mdx").write_str("b").unwrap();

        let config = Config::builder()
            .input_dir(temp.path())
            .output_dir(temp.path().join("outputs"))
            .file_filter_config(FileFilterConfig::new().include(vec!["*.mdx".into()]))
            .build()
            .unwrap();

        let files = Scanner::new(&config).unwrap().scan().unwrap();
        assert_eq!(names(&files), vec!["b.mdx"]);
    }
}
