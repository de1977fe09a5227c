//! Interactive REPL for GlobeGuide
//!
//! Wires config into a [`ChatSession`] and runs it.

mod session;

pub use session::{ChatSession, FAREWELL, SessionOptions, TurnOutcome, is_exit_command};

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::destinations::KnownDestinations;
use crate::extraction::PreferenceExtractor;
use crate::llm::create_client;
use crate::memory::SessionStore;
use crate::prompts::PromptLoader;

/// Run the interactive chat
///
/// This is the main entry point for `gg` / `gg chat`.
pub async fn run_interactive(config: &Config, verbose: bool) -> Result<()> {
    // Validate API key early
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let destinations = Arc::new(KnownDestinations::load(&config.storage.destinations_file));
    let prompts = Arc::new(PromptLoader::new(&config.storage.prompts_dir));
    let extractor = PreferenceExtractor::new(
        llm.clone(),
        destinations,
        &prompts,
        config.llm.extraction_max_tokens,
    )?;
    let store = SessionStore::new(&config.storage.state_file);

    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        state_file = %config.storage.state_file.display(),
        "Starting chat session"
    );

    let options = SessionOptions {
        verbose,
        max_tokens: config.llm.max_tokens,
        max_turns: config.history.max_turns,
    };
    let mut session = ChatSession::new(llm, extractor, prompts, store, options);
    session.run().await
}
