//! Directory-backed template store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{RapportError, Result};

use super::model::ReportTemplate;

/// File suffix of stored templates.
pub const TEMPLATE_SUFFIX: &str = ".template.json";

/// Stores one `<slug>.template.json` file per template name.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    /// Use `root` as the store directory. It is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a template name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", slugify(name), TEMPLATE_SUFFIX))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Save a template, replacing any template with the same slug.
    pub fn save(&self, template: &ReportTemplate) -> Result<PathBuf> {
        if template.name.trim().is_empty() {
            return Err(RapportError::Config("Template name is empty".to_string()));
        }
        let path = self.path_for(&template.name);
        template.save(&path)?;
        info!(
            name = %template.name,
            path = %path.display(),
            stages = template.operations.len(),
            "Saved template"
        );
        Ok(path)
    }

    /// Load a template by name.
    pub fn load(&self, name: &str) -> Result<ReportTemplate> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(RapportError::TemplateNotFound(name.to_string()));
        }
        ReportTemplate::load(path)
    }

    /// All readable templates, sorted by name. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<ReportTemplate>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| RapportError::Io {
            path: self.root.clone(),
            source: e,
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RapportError::Io {
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_template = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEMPLATE_SUFFIX));
            if !is_template {
                continue;
            }
            match ReportTemplate::load(&path) {
                Ok(template) => templates.push(template),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable template: {}", e),
            }
        }

        templates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(templates)
    }

    /// Delete a template by name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(RapportError::TemplateNotFound(name.to_string()));
        }
        fs::remove_file(&path).map_err(|e| RapportError::Io {
            path: path.clone(),
            source: e,
        })?;
        info!(name, path = %path.display(), "Deleted template");
        Ok(())
    }
}

/// File-name-safe form of a template name.
///
/// Letters and digits are lower-cased and kept; every other run of
/// characters becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "template".to_string()
    } else {
        slug
    }
}
