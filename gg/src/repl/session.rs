//! Chat session: one extraction and one reply per turn

use std::sync::Arc;

use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::extraction::PreferenceExtractor;
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::memory::{SessionState, SessionStore};
use crate::prompts::PromptLoader;

/// Printed when the session ends normally
pub const FAREWELL: &str = "👋 Goodbye! Safe travels!";

/// Knobs for a chat session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Print the updated preference map after every extraction
    pub verbose: bool,
    /// Max tokens for the reply call
    pub max_tokens: u32,
    /// Cap on stored turns; `None` keeps everything
    pub max_turns: Option<usize>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            max_tokens: 1024,
            max_turns: None,
        }
    }
}

/// What a single line of input led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant replied; the turn has been persisted
    Reply(String),
    /// The user asked to leave; state has been persisted
    Exit,
    /// Blank input, nothing happened
    Ignored,
}

/// True for `exit` or `quit` in any letter case
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Interactive travel-planning session
pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    extractor: PreferenceExtractor,
    prompts: Arc<PromptLoader>,
    store: SessionStore,
    state: SessionState,
    options: SessionOptions,
}

impl ChatSession {
    /// Create a session, loading any stored state from `store`
    pub fn new(
        llm: Arc<dyn LlmClient>,
        extractor: PreferenceExtractor,
        prompts: Arc<PromptLoader>,
        store: SessionStore,
        options: SessionOptions,
    ) -> Self {
        let state = store.load();
        debug!(
            preferences = state.preferences.len(),
            turns = state.history.len(),
            ?options,
            "ChatSession::new: called"
        );
        Self {
            llm,
            extractor,
            prompts,
            store,
            state,
            options,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Persist the current state
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.state).context("Failed to save session state")
    }

    /// Handle one line of user input
    ///
    /// Extraction failures are absorbed; reply and save failures are returned.
    pub async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        if is_exit_command(input) {
            debug!("handle_input: exit requested");
            self.save()?;
            return Ok(TurnOutcome::Exit);
        }

        self.state.preferences = self.extractor.extract(input, &self.state.preferences).await;

        if self.options.verbose {
            self.print_preferences();
        }

        let system_prompt = self.prompts.system_prompt(&self.state.preferences)?;
        let mut messages = self.state.history.to_messages();
        messages.push(Message::user(input));
        let request = CompletionRequest::text(system_prompt, messages, self.options.max_tokens);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| eyre::eyre!("LLM error: {}", e))?;
        let reply = response.content.unwrap_or_default();
        debug!(
            reply_len = reply.len(),
            stop_reason = ?response.stop_reason,
            usage = ?response.usage,
            "handle_input: got reply"
        );

        self.state.history.add_user_message(input);
        self.state.history.add_ai_message(reply.clone());
        if let Some(max_turns) = self.options.max_turns {
            self.state.history.retain_last(max_turns);
        }
        self.save()?;

        Ok(TurnOutcome::Reply(reply))
    }

    /// Run the interactive loop until exit or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "You:".bright_green()));

            match readline {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.trim());
                    }
                    match self.handle_input(&line).await? {
                        TurnOutcome::Reply(reply) => {
                            println!("{} {}", "AI:".bright_blue(), reply.trim());
                            println!();
                        }
                        TurnOutcome::Exit => break,
                        TurnOutcome::Ignored => continue,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - leave as if the user typed exit
                    println!();
                    self.save()?;
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        info!(turns = self.state.history.len(), "Session ended");
        println!("{}", FAREWELL);
        Ok(())
    }

    fn print_welcome(&self) {
        println!("{}", "🌍 Welcome to GlobeGuide, your proactive travel planner!".bright_cyan().bold());
        println!("Type {} anytime to quit.", "'exit'".yellow());
        if !self.state.preferences.is_empty() {
            println!(
                "{}",
                crate::preferences::preferences_to_text(&self.state.preferences).dimmed()
            );
        }
        println!();
    }

    fn print_preferences(&self) {
        let rendered = serde_json::to_string_pretty(&self.state.preferences)
            .unwrap_or_else(|_| format!("{:?}", self.state.preferences));
        println!("{} {}", "[debug] Updated preferences:".dimmed(), rendered.dimmed());
    }
}
