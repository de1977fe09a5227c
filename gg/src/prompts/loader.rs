//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::preferences::{PreferenceMap, preferences_to_text};

/// Values available to prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    /// Human-readable traveller preferences
    pub preferences: String,
}

impl TemplateContext {
    /// Context carrying the rendered preference summary
    pub fn for_preferences(preferences: &PreferenceMap) -> Self {
        Self {
            preferences: preferences_to_text(preferences),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine (HTML escaping disabled)
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `~/.config/globeguide/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `override_dir` before the embedded prompts
    pub fn new(override_dir: impl AsRef<Path>) -> Self {
        let override_dir = override_dir.as_ref();
        let exists = override_dir.is_dir();
        debug!(?override_dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            override_dir: exists.then(|| override_dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks `{override_dir}/{name}.pmt` first, then the embedded prompt.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &TemplateContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        let rendered = self
            .hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))?;
        Ok(rendered.trim().to_string())
    }

    /// Assistant system prompt embedding the current preferences
    pub fn system_prompt(&self, preferences: &PreferenceMap) -> Result<String> {
        self.render("system", &TemplateContext::for_preferences(preferences))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_system_prompt_without_preferences() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.system_prompt(&PreferenceMap::new()).unwrap();
        assert!(prompt.starts_with("You are GlobeGuide"));
        assert!(prompt.ends_with("Ask follow-up questions to learn more."));
    }

    #[test]
    fn test_system_prompt_is_not_html_escaped() {
        let loader = PromptLoader::embedded_only();
        let prefs: PreferenceMap = [("destination", "Trinidad & Tobago")].into_iter().collect();
        let prompt = loader.system_prompt(&prefs).unwrap();
        assert!(prompt.contains("destination: Trinidad & Tobago"));
    }

    #[test]
    fn test_override_directory_takes_precedence() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("system.pmt"), "Custom persona. {{preferences}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let prompt = loader.system_prompt(&PreferenceMap::new()).unwrap();
        assert!(prompt.starts_with("Custom persona."));

        // Templates missing from the override dir still come from the embedded set
        let extract = loader.render("extract", &TemplateContext::default()).unwrap();
        assert!(extract.contains("information extraction assistant"));
    }

    #[test]
    fn test_missing_override_directory_is_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let loader = PromptLoader::new(temp.path().join("nope"));
        assert!(loader.render("extract", &TemplateContext::default()).is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.render("nonexistent-template", &TemplateContext::default()).is_err());
    }
}
