//! Template compilation: load, substitute, parse, materialize.

use crate::loader::{load_template, locate, TemplateHost};
use crate::materialize::{materialize, Materialized};
use crate::slots::{substitute, Slots};
use markupkit_common::Result;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Turns markup text or template files into node trees.
#[derive(Default)]
pub struct TemplateCompiler {
    host: Option<Box<dyn TemplateHost>>,
    executable_extensions: Vec<String>,
}

impl fmt::Debug for TemplateCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCompiler")
            .field("host", &self.host.is_some())
            .field("executable_extensions", &self.executable_extensions)
            .finish()
    }
}

impl TemplateCompiler {
    /// A compiler for plain markup templates only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route files with the given extensions (without the dot, case
    /// insensitive) through an external template host.
    pub fn with_host<I, S>(mut self, host: impl TemplateHost + 'static, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.host = Some(Box::new(host));
        self.executable_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// The host responsible for `path`, if it is an executable template.
    fn host_for(&self, path: &Path) -> Option<&dyn TemplateHost> {
        let host = self.host.as_deref()?;
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.executable_extensions
            .iter()
            .any(|ext| *ext == extension)
            .then_some(host)
    }

    /// Parse markup text and materialize it.
    ///
    /// With `as_document`, a page starting with a doctype or `html` element
    /// becomes a [`Document`](markupkit_dom::Document).
    pub fn from_html_text(&self, text: &str, as_document: bool) -> Result<Materialized> {
        let records = markupkit_html::parse(text)?;
        debug!(
            input_len = text.len(),
            records = records.iter().map(|r| r.count()).sum::<usize>(),
            "compiling markup"
        );
        Ok(materialize(&records, as_document))
    }

    /// Substitute slots into markup text, then parse and materialize it.
    pub fn compile_str(&self, text: &str, slots: &Slots, as_document: bool) -> Result<Materialized> {
        self.from_html_text(&substitute(text, slots), as_document)
    }

    /// Produce the markup of a template file with slots substituted.
    ///
    /// Executable templates are rendered by the host first; its output is
    /// then treated like plain template text.
    pub fn render_file(&self, path: &Path, slots: &Slots) -> Result<String> {
        let text = match self.host_for(path) {
            Some(host) => host.render(locate(path)?, slots)?,
            None => load_template(path)?,
        };
        Ok(substitute(&text, slots))
    }

    /// Load, substitute, parse and materialize a template file.
    pub fn compile_file(&self, path: &Path, slots: &Slots, as_document: bool) -> Result<Materialized> {
        let markup = self.render_file(path, slots)?;
        self.from_html_text(&markup, as_document)
    }
}
