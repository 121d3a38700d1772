use crate::{
    config::Config,
    error::{Error, Result},
    file::Document,
    template_validator::TemplateValidator,
};
use serde::Serialize;
use tera::{Context, Tera};

/// Name under which the built-in RAG template is registered.
pub(crate) const BUILTIN_TEMPLATE: &str = "rag_document";
const CUSTOM_TEMPLATE: &str = "custom_prompt";

#[derive(Serialize)]
struct PromptContext<'a> {
    document: &'a str,
    file_name: &'a str,
}

/// Builds model prompts by substituting document text into a template.
///
/// Document text is inserted verbatim: templates are registered under
/// names without an `.html`/`.xml` suffix, so Tera never autoescapes them.
pub struct PromptFormatter {
    tera: Tera,
    template_name: &'static str,
}

impl PromptFormatter {
    /// Creates a formatter from configuration, loading and validating the
    /// custom template when one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a template cannot be read, compiled or validated.
    pub fn new(config: &Config) -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_builtin_template(&mut tera)?;

        let template_name = match config.template_path {
            Some(ref path) => {
                let source = TemplateValidator::validate_template(path)?;
                tera.add_raw_template(CUSTOM_TEMPLATE, &source)
                    .map_err(|e| Error::template(path.display().to_string(), &e))?;
                CUSTOM_TEMPLATE
            }
            None => BUILTIN_TEMPLATE,
        };

        Ok(Self { tera, template_name })
    }

    /// Creates a formatter using the built-in RAG documentation template.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template fails to compile.
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_builtin_template(&mut tera)?;
        Ok(Self {
            tera,
            template_name: BUILTIN_TEMPLATE,
        })
    }

    fn register_builtin_template(tera: &mut Tera) -> Result<()> {
        tera.add_raw_template(
            BUILTIN_TEMPLATE,
            include_str!("../templates/rag_document.tera"),
        )
        .map_err(|e| Error::template(BUILTIN_TEMPLATE, &e))
    }

    /// Renders the prompt for raw document text.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn format(&self, text: &str) -> Result<String> {
        self.render(text, "")
    }

    /// Renders the prompt for a loaded document, exposing its file name to
    /// the template as `file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn format_document(&self, document: &Document) -> Result<String> {
        self.render(&document.content, &document.file_name)
    }

    fn render(&self, text: &str, file_name: &str) -> Result<String> {
        let context = PromptContext {
            document: text,
            file_name,
        };
        let tera_context =
            Context::from_serialize(&context).map_err(|e| Error::template(self.template_name, &e))?;

        self.tera
            .render(self.template_name, &tera_context)
            .map_err(|e| Error::template(self.template_name, &e))
    }
}
