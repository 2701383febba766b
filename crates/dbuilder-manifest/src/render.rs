//! Dockerfile template rendering with Tera.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use dbuilder_common::error::{DbuilderError, Result};
use tera::{Context, Tera};
use walkdir::WalkDir;

/// Variables a template is rendered with.
#[derive(Debug, Clone, Copy)]
pub struct RenderVariables<'a> {
    /// Host-prefixed image path, e.g. `docker.io/library/debian`.
    pub name: &'a str,
    /// The tag being rendered.
    pub tag: &'a str,
    /// Per-template custom variables.
    pub jinja_env: &'a BTreeMap<String, serde_json::Value>,
}

/// Renders a template file into Dockerfile text.
pub trait TemplateRenderer {
    /// Renders `template` with `variables`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be read or rendered.
    fn render(&self, template: &Path, variables: &RenderVariables<'_>) -> Result<String>;
}

/// [`TemplateRenderer`] using Tera's Jinja2-compatible syntax.
///
/// Every file under the template's directory is registered by its relative
/// path, so templates can `include`, `extends` or `import` their siblings.
/// Templates see `name`, `tag` and `jinja_env`. Output is not escaped and
/// undefined variables are errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraRenderer;

impl TemplateRenderer for TeraRenderer {
    fn render(&self, template: &Path, variables: &RenderVariables<'_>) -> Result<String> {
        let content =
            std::fs::read_to_string(template).map_err(|e| DbuilderError::io(template, e))?;
        let entry = template
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match template.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut templates = sibling_templates(dir, &entry)?;
        templates.push((entry.clone(), content));

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(templates)
            .map_err(|e| template_error(template, &e))?;

        let mut context = Context::new();
        context.insert("name", variables.name);
        context.insert("tag", variables.tag);
        context.insert("jinja_env", variables.jinja_env);

        tera.render(&entry, &context)
            .map_err(|e| template_error(template, &e))
    }
}

/// Reads every text file under `dir` except `entry`, named by its path
/// relative to `dir` with `/` separators.
fn sibling_templates(dir: &Path, entry: &str) -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for item in WalkDir::new(dir).follow_links(true) {
        let item = item.map_err(|e| {
            let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
            DbuilderError::io(path, e.into())
        })?;
        if !item.file_type().is_file() {
            continue;
        }
        let Ok(relative) = item.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name == entry {
            continue;
        }

        match std::fs::read_to_string(item.path()) {
            Ok(content) => templates.push((name, content)),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::debug!(path = %item.path().display(), "skipping non-text file");
            }
            Err(e) => return Err(DbuilderError::io(item.path(), e)),
        }
    }
    Ok(templates)
}

fn template_error(template: &Path, err: &tera::Error) -> DbuilderError {
    DbuilderError::Template {
        path: template.to_path_buf(),
        message: error_chain(err),
    }
}

/// Tera reports the useful detail (missing variable, syntax position) in
/// the error source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}
