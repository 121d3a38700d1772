use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tera::Tera;

/// Maximum prompt template size (1MB)
const MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

/// The document text must reach the model, so templates have to use it.
const REQUIRED_VARIABLE: &str = "document";

/// Available but not required
const OPTIONAL_VARIABLES: &[&str] = &["file_name"];

/// Validates user-supplied prompt templates before any file is processed.
pub(crate) struct TemplateValidator;

impl TemplateValidator {
    /// Validates a prompt template file and returns its source.
    ///
    /// Checks, in order: the path is a file, it is at most 1MB, it is not
    /// blank, it compiles as Tera, and it references `document`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read, or
    /// [`Error::Template`] for any validation failure.
    pub(crate) fn validate_template(path: &Path) -> Result<String> {
        let name = path.display().to_string();

        let metadata = fs::metadata(path).map_err(|e| Error::read_io(path, &e))?;
        if !metadata.is_file() {
            return Err(Error::template_validation(name, "Path is not a file"));
        }

        if metadata.len() > MAX_TEMPLATE_SIZE {
            return Err(Error::template_validation(
                name,
                format!(
                    "Template file too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    MAX_TEMPLATE_SIZE
                ),
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| Error::read_io(path, &e))?;

        if content.trim().is_empty() {
            return Err(Error::template_validation(name, "Template file is empty"));
        }

        Tera::default()
            .add_raw_template("validation", &content)
            .map_err(|e| {
                Error::template_validation(&name, format!("Template syntax error: {e}"))
            })?;

        if !Self::references(&content, REQUIRED_VARIABLE) {
            return Err(Error::template_validation(
                name,
                "Template never uses {{ document }}, so the model would not see the file content",
            ));
        }

        for var in OPTIONAL_VARIABLES {
            if !Self::references(&content, var) {
                tracing::debug!("Template does not use optional variable: {}", var);
            }
        }

        Ok(content)
    }

    /// Heuristic check for `{{ var }}`, `{{ var | filter }}` and `{% if var %}` style uses.
    fn references(content: &str, var: &str) -> bool {
        let mut rest = content;
        loop {
            let expr = rest.find("{{").map(|i| (i, "}}"));
            let stmt = rest.find("{%").map(|i| (i, "%}"));
            let Some((open, closing)) = [expr, stmt].into_iter().flatten().min() else {
                break;
            };
            let after = &rest[open + 2..];
            let Some(close) = after.find(closing) else {
                break;
            };
            let inner = &after[..close];
            if inner
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|token| token == var)
            {
                return true;
            }
            rest = &after[close + 2..];
        }
        false
    }
}
