//! Preference extraction
//!
//! One JSON-mode LLM call turns an utterance into [`TripPreferences`], which
//! is then merged into the current [`PreferenceMap`]. Extraction failures are
//! never fatal: [`PreferenceExtractor::extract`] falls back to the previous
//! preferences, while [`PreferenceExtractor::try_extract`] exposes the error.

use std::sync::Arc;

use eyre::Result;
use thiserror::Error;
use tracing::debug;

use crate::destinations::KnownDestinations;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::preferences::{PreferenceMap, TripPreferences};
use crate::prompts::{PromptLoader, TemplateContext};

/// Why an extraction produced no update
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model returned an empty reply")]
    EmptyResponse,

    #[error("no JSON object found in model reply")]
    NoJsonObject,

    #[error("model reply does not match the preference schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Parse a model reply into [`TripPreferences`]
///
/// Tolerates Markdown code fences and prose around the object.
pub fn parse_model_output(text: &str) -> Result<TripPreferences, ExtractionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let start = text.find('{').ok_or(ExtractionError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ExtractionError::NoJsonObject)?;
    if end < start {
        return Err(ExtractionError::NoJsonObject);
    }

    Ok(serde_json::from_str(&text[start..=end])?)
}

/// Extracts traveller preferences from free-form messages
pub struct PreferenceExtractor {
    llm: Arc<dyn LlmClient>,
    destinations: Arc<KnownDestinations>,
    system_prompt: String,
    max_tokens: u32,
}

impl PreferenceExtractor {
    /// Create an extractor, rendering the `extract` template once
    pub fn new(
        llm: Arc<dyn LlmClient>,
        destinations: Arc<KnownDestinations>,
        prompts: &PromptLoader,
        max_tokens: u32,
    ) -> Result<Self> {
        debug!(%max_tokens, "PreferenceExtractor::new: called");
        let system_prompt = prompts.render("extract", &TemplateContext::default())?;
        Ok(Self {
            llm,
            destinations,
            system_prompt,
            max_tokens,
        })
    }

    /// Ask the model for the preferences mentioned in `utterance`
    pub async fn request(&self, utterance: &str) -> Result<TripPreferences, ExtractionError> {
        debug!(utterance_len = utterance.len(), "PreferenceExtractor::request: called");
        let request = CompletionRequest::json(
            self.system_prompt.clone(),
            vec![Message::user(utterance)],
            self.max_tokens,
        );

        let response = self.llm.complete(request).await?;
        let content = response.content.ok_or(ExtractionError::EmptyResponse)?;
        parse_model_output(&content)
    }

    /// Extract and merge, surfacing any failure
    pub async fn try_extract(&self, utterance: &str, current: &PreferenceMap) -> Result<PreferenceMap, ExtractionError> {
        let extracted = self.request(utterance).await?;
        debug!(?extracted, "try_extract: model extracted");
        Ok(extracted.merge_into(current, &self.destinations))
    }

    /// Extract and merge, keeping `current` unchanged when extraction fails
    pub async fn extract(&self, utterance: &str, current: &PreferenceMap) -> PreferenceMap {
        match self.try_extract(utterance, current).await {
            Ok(updated) => updated,
            Err(e) => {
                debug!(error = %e, "Preference extraction failed");
                current.clone()
            }
        }
    }
}
