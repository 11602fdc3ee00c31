//! HTML template rendering.
//!
//! Every `*.html` file in the views directory is registered so templates can
//! `{% include %}` or `{% extends %}` each other, then the configured template
//! is rendered with strict undefined-variable checking.

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::RenderError;

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    views_dir: PathBuf,
    template_name: String,
}

impl TemplateRenderer {
    pub fn new(views_dir: impl Into<PathBuf>, template_name: impl Into<String>) -> Self {
        Self {
            views_dir: views_dir.into(),
            template_name: template_name.into(),
        }
    }

    /// Resolved path of the main template, reported back to clients on failure.
    pub fn template_path(&self) -> PathBuf {
        self.views_dir.join(&self.template_name)
    }

    /// Load the views directory and render the main template with `context`.
    ///
    /// Templates are re-read on every call, so edits to the views show up
    /// without a restart.
    pub fn render<S: Serialize>(&self, context: &S) -> Result<String, RenderError> {
        if !self.views_dir.is_dir() {
            return Err(RenderError::ViewsDirMissing(self.views_dir.clone()));
        }
        let template_path = self.template_path();
        if !template_path.is_file() {
            return Err(RenderError::TemplateMissing(template_path));
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let names = load_views(&mut env, &self.views_dir)?;

        let template = env.get_template(&self.template_name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                RenderError::NotFound {
                    name: self.template_name.clone(),
                    available: names.join(", "),
                }
            } else {
                RenderError::Execute(e.to_string())
            }
        })?;

        template
            .render(context)
            .map_err(|e| RenderError::Execute(e.to_string()))
    }
}

/// Register every `*.html` in `dir` under its file name; returns the names, sorted.
fn load_views(env: &mut Environment<'static>, dir: &Path) -> Result<Vec<String>, RenderError> {
    let pattern = dir.join("*.html").display().to_string();
    let entries = fs::read_dir(dir).map_err(|e| RenderError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RenderError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("html") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        let source = fs::read_to_string(&path).map_err(|e| RenderError::Read {
            path: path.clone(),
            source: e,
        })?;
        env.add_template_owned(name.clone(), source)
            .map_err(|e| RenderError::Parse {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        names.push(name);
    }

    names.sort();
    log::debug!("Loaded {} view(s) from {}", names.len(), dir.display());
    Ok(names)
}
