//! GlobeGuide - proactive travel-planning chat assistant
//!
//! Each user message goes through two model calls: a JSON-mode extraction
//! that updates the remembered traveller preferences, then a conversational
//! reply whose system prompt carries those preferences. Preferences and the
//! transcript are written to a single JSON document after every turn so a
//! later run picks up where the last one stopped.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with OpenAI-compatible and Anthropic implementations
//! - [`preferences`] - Preference map, merge rules and the prompt summary
//! - [`destinations`] - Known destination list and name normalization
//! - [`extraction`] - Model-driven preference extraction
//! - [`memory`] - Conversation history and the on-disk session store
//! - [`prompts`] - Handlebars prompt templates
//! - [`repl`] - Interactive chat loop
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod destinations;
pub mod extraction;
pub mod llm;
pub mod memory;
pub mod preferences;
pub mod prompts;
pub mod repl;

pub use config::Config;
pub use destinations::KnownDestinations;
pub use extraction::{ExtractionError, PreferenceExtractor};
pub use llm::{LlmClient, LlmError};
pub use memory::{ChatHistory, ChatTurn, SessionState, SessionStore};
pub use preferences::{PreferenceMap, TripPreferences, preferences_to_text};
pub use prompts::PromptLoader;
pub use repl::{ChatSession, SessionOptions, TurnOutcome};
