use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A markdown file loaded from the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path the document was read from
    pub path: PathBuf,

    /// File name for display and reporting
    pub file_name: String,

    /// File name exactly as on disk, reused as the output file name
    pub raw_file_name: OsString,

    /// Raw text content
    pub content: String,
}

impl Document {
    /// Creates a document from already loaded content.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let file_name = file_name_of(&path);
        let raw_file_name = path
            .file_name()
            .map_or_else(|| path.as_os_str().to_os_string(), |n| n.to_os_string());
        Self {
            path,
            file_name,
            raw_file_name,
            content: content.into(),
        }
    }

    /// Returns the content length in characters.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Returns the final path component as a displayable string.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads a whole file as UTF-8 text.
///
/// # Errors
///
/// Returns [`Error::Read`] if the path does not exist, is not a regular
/// file, or is not valid UTF-8.
pub fn load_document(path: &Path) -> Result<Document> {
    let metadata = fs::metadata(path).map_err(|e| Error::read_io(path, &e))?;
    if !metadata.is_file() {
        return Err(Error::read(path, "not a regular file"));
    }

    let content = fs::read_to_string(path).map_err(|e| Error::read_io(path, &e))?;
    Ok(Document::new(path, content))
}
