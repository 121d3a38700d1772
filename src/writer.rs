use crate::error::{Error, Result};
use std::{
    ffi::{OsStr, OsString},
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Writes formatted documents into the output directory.
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    /// Creates a writer targeting `output_dir`. Nothing is touched on disk
    /// until the first write.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `content` to `output_dir/file_name`, creating the directory if
    /// missing and replacing any existing file of that name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the directory cannot be created or the
    /// file cannot be written.
    pub fn write(&self, file_name: impl AsRef<OsStr>, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::write(&self.output_dir, &e))?;

        let path = self.output_dir.join(file_name.as_ref());
        Self::write_file_atomic(&path, content)?;

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    /// Writes through a temporary sibling file that is synced and then
    /// renamed over the target.
    fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
        let temp_path = Self::temp_path(path);

        let result = (|| {
            let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::write(&temp_path, &e))?;
            temp_file
                .write_all(content.as_bytes())
                .map_err(|e| Error::write(&temp_path, &e))?;
            temp_file.sync_all().map_err(|e| Error::write(&temp_path, &e))?;
            drop(temp_file);

            fs::rename(&temp_path, path).map_err(|e| Error::write(path, &e))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    /// `name.md` -> `.name.md.tmp`, hidden and never matching `*.md`.
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(path.file_name().unwrap_or_default());
        name.push(".tmp");
        path.with_file_name(name)
    }
}
